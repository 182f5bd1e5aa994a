//! CLI arguments and environment-derived settings.

use clap::Parser;

/// Accessibility-first browser automation agent.
#[derive(Debug, Parser)]
#[command(name = "axpilot", version, about)]
pub struct CliArgs {
    /// Natural-language goal to accomplish.
    pub goal: String,

    /// Step loop iteration cap.
    #[arg(long, default_value_t = 20)]
    pub max_steps: u32,

    /// Run the browser headless (forwarded to the driver when one is
    /// attached; the bundled demo driver ignores it).
    #[arg(long)]
    pub headless: bool,

    /// Use the deterministic rule-based planner instead of an LLM.
    #[arg(long)]
    pub no_llm: bool,

    /// Verbose (debug-level) logging.
    #[arg(long, short)]
    pub verbose: bool,
}

/// LLM endpoint settings read from the environment.
#[derive(Debug, Clone, Default)]
pub struct LlmEnv {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
}

impl LlmEnv {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("AXPILOT_LLM_API_KEY").ok().filter(|v| !v.is_empty()),
            api_base: std::env::var("AXPILOT_LLM_BASE").ok().filter(|v| !v.is_empty()),
            model: std::env::var("AXPILOT_LLM_MODEL").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn configured(&self) -> bool {
        self.api_key.is_some()
    }
}
