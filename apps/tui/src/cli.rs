use clap::{CommandFactory, Parser};
use perf_dashboard_tui::config::{LOG_FILE_VAR, URL_VAR};

#[derive(Debug, Parser)]
#[command(
    name = "perf-dashboard",
    version,
    about = "Terminal dashboard for aggregated profiling statistics"
)]
pub struct CliArgs {
    /// Print one synchronized page and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless output as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override the stats service URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Page to open, e.g. /sqlstatements?key_1=host&value_1=web-1
    #[arg(long, value_name = "PATH", default_value = "/callstacks")]
    pub page: String,

    /// Override the log file used while the terminal UI is running
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(url) = &self.url {
            std::env::set_var(URL_VAR, url);
        }
        if let Some(path) = &self.log_file {
            std::env::set_var(LOG_FILE_VAR, path);
        }
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}
