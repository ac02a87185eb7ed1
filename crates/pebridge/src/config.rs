//! Bridge configuration from environment variables.
//!
//! Every backend family has a base URL and one path (template) per routed
//! operation. Compiled defaults match the local development topology;
//! individual values are overridden by environment variables, and path
//! templates may additionally be overridden at startup by the agent fact
//! store (see the `mapping` module).

use std::env;

/// Configuration for the Property Exchange bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Function-caller backend base URL (`FC_BASE_URL`)
    pub function_base_url: String,

    /// Route listing the available tools (`FC_TOOLS_PATH`)
    pub function_tools_path: String,

    /// Route invoking a tool (`FC_CALL_PATH`)
    pub function_call_path: String,

    /// Persistence backend base URL (`PERSIST_BASE_URL`)
    pub persist_base_url: String,

    /// Read route template with `{collection}` / `{id}` placeholders
    /// (`PERSIST_GET_PATH`)
    pub persist_get_path: String,

    /// Write route template (`PERSIST_PUT_PATH`)
    pub persist_put_path: String,

    /// Planner backend base URL (`PLANNER_BASE_URL`)
    pub planner_base_url: String,

    /// Plan request route (`PLANNER_PLAN_PATH`)
    pub planner_plan_path: String,

    /// Agent identity keying the fact-store lookup (`AGENT_ID`)
    pub agent_id: String,

    /// Corpus holding the agent facts (`AGENT_CORPUS_ID`, `CORPUS_ID`)
    pub corpus_id: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            function_base_url: "http://127.0.0.1:8030".to_string(),
            function_tools_path: "/function-caller/tools".to_string(),
            function_call_path: "/function-caller/call".to_string(),
            persist_base_url: "http://127.0.0.1:8040".to_string(),
            persist_get_path: "/persist/{collection}/{id}".to_string(),
            persist_put_path: "/persist/{collection}/{id}".to_string(),
            planner_base_url: "http://127.0.0.1:8020".to_string(),
            planner_plan_path: "/planner/plan".to_string(),
            agent_id: "fountain.coach/agent/function-caller/service".to_string(),
            corpus_id: "agents".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            function_base_url: env_or("FC_BASE_URL", defaults.function_base_url),
            function_tools_path: env_or("FC_TOOLS_PATH", defaults.function_tools_path),
            function_call_path: env_or("FC_CALL_PATH", defaults.function_call_path),
            persist_base_url: env_or("PERSIST_BASE_URL", defaults.persist_base_url),
            persist_get_path: env_or("PERSIST_GET_PATH", defaults.persist_get_path),
            persist_put_path: env_or("PERSIST_PUT_PATH", defaults.persist_put_path),
            planner_base_url: env_or("PLANNER_BASE_URL", defaults.planner_base_url),
            planner_plan_path: env_or("PLANNER_PLAN_PATH", defaults.planner_plan_path),
            agent_id: env_or("AGENT_ID", defaults.agent_id),
            corpus_id: env::var("AGENT_CORPUS_ID")
                .or_else(|_| env::var("CORPUS_ID"))
                .unwrap_or(defaults.corpus_id),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_topology() {
        let config = BridgeConfig::default();
        assert_eq!(config.function_base_url, "http://127.0.0.1:8030");
        assert_eq!(config.persist_get_path, "/persist/{collection}/{id}");
        assert_eq!(config.planner_plan_path, "/planner/plan");
        assert_eq!(config.corpus_id, "agents");
    }
}
