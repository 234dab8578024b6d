use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use leetcode_helper_core_sdk::{
    client::SolverClient,
    config::Settings,
    credentials::CredentialStore,
    db,
    models::{Language, SolveRequest, UserLevel, DEFAULT_PROVIDER, KNOWN_PROVIDERS},
    render, telemetry,
    storage::SqliteStorage,
};

/**
 * \brief CLI 程序入口：管理本地 API Key 并向解题后端提交题目。
 */
#[derive(Parser, Debug)]
#[command(
    name = "leetcode-helper",
    version,
    about = "Solve LeetCode problems through an AI backend"
)]
struct Cli {
    /** \brief 后端地址，覆盖 LEETCODE_HELPER_API_BASE */
    #[arg(long, global = true)]
    api_base: Option<String>,

    /** \brief 本地数据库路径，覆盖 LEETCODE_HELPER_DB */
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /**
     * \brief 管理各 Provider 的本地 API Key。
     */
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /**
     * \brief 列出后端支持的 Provider。
     */
    Providers,

    /**
     * \brief 提交题目并显示解答。
     */
    Solve {
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,
        #[arg(long, default_value_t = Language::default())]
        language: Language,
        #[arg(long, default_value_t = UserLevel::default())]
        level: UserLevel,
        /** \brief 题目原文 */
        #[arg(long, conflicts_with = "file")]
        problem: Option<String>,
        /** \brief 从文件读取题目 */
        #[arg(long)]
        file: Option<PathBuf>,
        /** \brief 本次使用的 API Key，缺省时读取已保存的 Key */
        #[arg(long)]
        api_key: Option<String>,
        /** \brief 输出原始 JSON */
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /**
     * \brief 开关本地遥测日志。
     */
    Telemetry {
        #[arg(value_enum)]
        state: Switch,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /** \brief 保存（覆盖）API Key */
    Save {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        key: String,
    },
    /** \brief 掩码显示已保存的 API Key */
    Show {
        #[arg(long)]
        provider: String,
    },
    /** \brief 删除已保存的 API Key */
    Clear {
        #[arg(long)]
        provider: String,
    },
    /** \brief 查看是否已保存，省略 provider 时列出已知及已保存的全部 Provider */
    Status {
        #[arg(long)]
        provider: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().with_overrides(cli.api_base, cli.db);

    let storage = SqliteStorage::open(&settings.db_path)
        .with_context(|| format!("open database {} failed", settings.db_path.display()))?;
    let telemetry_enabled = db::get_telemetry_enabled(storage.connection()).unwrap_or(false);
    telemetry::set_log_dir(settings.log_dir.clone());
    telemetry::set_enabled(telemetry_enabled);

    let store = CredentialStore::with_namespace(storage, settings.namespace.clone());

    match cli.command {
        Commands::Key { action } => run_key(&store, action)?,
        Commands::Providers => {
            let client = SolverClient::new(&settings.api_base)?;
            let providers = client.list_providers().await?;
            println!("{}", serde_json::to_string_pretty(&providers)?);
        }
        Commands::Solve {
            provider,
            language,
            level,
            problem,
            file,
            api_key,
            json,
        } => {
            let problem_text = match (problem, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read problem file {} failed", path.display()))?,
                (None, None) => bail!("provide the problem with --problem or --file"),
            };
            let api_key = match api_key {
                Some(key) => key,
                None => store.get(&provider).unwrap_or_default(),
            };

            let request = SolveRequest {
                problem_text,
                language: language.to_string(),
                user_level: level.to_string(),
                provider: provider.clone(),
                api_key,
            };
            if request.api_key.trim().is_empty() {
                bail!(
                    "no API key for {}, run: leetcode-helper key save --provider {} --key ...",
                    provider,
                    provider
                );
            }
            request.validate()?;

            let client = SolverClient::new(&settings.api_base)?;
            eprintln!("Generating solution via {} ({})...", provider, client.base_url());
            let solution = client.solve(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&solution)?);
            } else {
                print!("{}", render::render_solution(&solution));
            }
        }
        Commands::Telemetry { state } => {
            let enabled = matches!(state, Switch::On);
            db::set_telemetry_enabled(store.storage().connection(), enabled)
                .context("save telemetry failed")?;
            telemetry::set_enabled(enabled);
            println!(
                "Telemetry {} (log file: {})",
                if enabled { "enabled" } else { "disabled" },
                telemetry::log_path().display()
            );
        }
    }

    Ok(())
}

fn run_key(store: &CredentialStore<SqliteStorage>, action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Save { provider, key } => {
            store
                .save(&provider, key.trim())
                .context("save api key failed")?;
            println!("Saved API key for {} (stored locally only)", provider);
        }
        KeyAction::Show { provider } => match store.get(&provider) {
            Some(secret) if !secret.is_empty() => {
                println!("{}: {}", provider, render::mask_secret(&secret))
            }
            _ => println!("{}: no API key saved", provider),
        },
        KeyAction::Clear { provider } => {
            store.remove(&provider).context("clear api key failed")?;
            println!("Cleared API key for {}", provider);
        }
        KeyAction::Status { provider } => {
            let providers: Vec<String> = match provider {
                Some(p) => vec![p],
                None => {
                    let mut all: Vec<String> =
                        KNOWN_PROVIDERS.iter().map(|p| p.to_string()).collect();
                    for saved in store.saved_providers().context("list saved keys failed")? {
                        if !all.contains(&saved) {
                            all.push(saved);
                        }
                    }
                    all
                }
            };
            for p in providers {
                let state = if store.has(&p) { "saved" } else { "missing" };
                println!("{:<8} {}", p, state);
            }
        }
    }
    Ok(())
}
