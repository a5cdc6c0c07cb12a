use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kvdump")]
#[command(about = "Export every kv secret mount into a local file tree")]
pub struct Cli {
    #[arg(long, env = "VAULT_ADDR")]
    pub addr: Option<String>,
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[arg(long, env = "VAULT_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,
    #[arg(long, env = "VAULT_NAMESPACE", help = "Namespace the export starts from")]
    pub namespace: Option<String>,
    #[arg(long, env = "KVDUMP_OUT", default_value = "export")]
    pub out: PathBuf,
    #[arg(
        long,
        env = "VAULT_SKIP_VERIFY",
        value_parser = BoolishValueParser::new(),
        help = "Allow http:// and invalid TLS certificates"
    )]
    pub insecure: bool,
    #[arg(long, help = "Do not descend into child namespaces")]
    pub root_only: bool,
    #[arg(long, help = "Write indented JSON")]
    pub pretty: bool,
    #[arg(long, help = "Leave files whose contents already match")]
    pub skip_unchanged: bool,
    #[arg(long, help = "Write files in place instead of temp file + rename")]
    pub no_atomic: bool,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
