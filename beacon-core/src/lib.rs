pub mod audit;
pub mod config;
pub mod crawl;
pub mod error;
pub mod report;
pub mod store;

pub use audit::{AuditOutcome, execute_audit, regenerate_reports};
pub use config::{AuditConfig, ConfigOverrides};
pub use error::{CoreError, Result};
pub use store::ResultStore;

use colored::Colorize;

const BANNER: &str = r#"
    ██████╗ ███████╗ █████╗  ██████╗ ██████╗ ███╗   ██╗
    ██╔══██╗██╔════╝██╔══██╗██╔════╝██╔═══██╗████╗  ██║
    ██████╔╝█████╗  ███████║██║     ██║   ██║██╔██╗ ██║
    ██╔══██╗██╔══╝  ██╔══██║██║     ██║   ██║██║╚██╗██║
    ██████╔╝███████╗██║  ██║╚██████╗╚██████╔╝██║ ╚████║
    ╚═════╝ ╚══════╝╚═╝  ╚═╝ ╚═════╝ ╚═════╝ ╚═╝  ╚═══╝
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan());
    println!(
        "    {} v{}\n",
        "Site-wide WCAG accessibility audits".dimmed(),
        env!("CARGO_PKG_VERSION")
    );
}
