//! Agent wiring for one CLI invocation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use agent_core::{
    Agent, AgentConfig, AgentResult, FallbackPlanner, HttpLlmClient, HttpLlmConfig, LlmClient,
    MockLlmClient,
};

use super::env::{CliArgs, LlmEnv};
use crate::demo;

/// Build the agent from CLI flags and environment, run the goal, and return
/// the terminal result. Ctrl-C cancels at the next iteration boundary.
pub async fn execute(cli: &CliArgs) -> Result<AgentResult> {
    let config = AgentConfig::default().max_steps(cli.max_steps);
    let driver = demo::demo_driver();
    if cli.headless {
        info!("headless requested; the demo driver has no display either way");
    }

    let mut agent = if cli.no_llm {
        info!("planner: deterministic fallback (--no-llm)");
        Agent::with_planner(driver as _, Arc::new(FallbackPlanner::new()), config)
    } else {
        Agent::new(driver as _, select_llm(&LlmEnv::from_env())?, config)
    };

    let cancel = agent.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling at the next step boundary");
            cancel.cancel();
        }
    });

    Ok(agent.run(&cli.goal).await)
}

fn select_llm(env: &LlmEnv) -> Result<Arc<dyn LlmClient>> {
    if env.configured() {
        let mut config = HttpLlmConfig {
            api_key: env.api_key.clone().unwrap_or_default(),
            timeout: Duration::from_secs(30),
            ..HttpLlmConfig::default()
        };
        if let Some(base) = &env.api_base {
            config.api_base = base.clone();
        }
        if let Some(model) = &env.model {
            config.model = model.clone();
        }
        info!(model = %config.model, "planner: LLM at {}", config.api_base);
        return Ok(Arc::new(HttpLlmClient::new(config)?));
    }

    warn!("AXPILOT_LLM_API_KEY not set; using the scripted mock LLM");
    Ok(Arc::new(MockLlmClient::new()))
}
