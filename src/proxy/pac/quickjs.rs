//! PAC evaluation in an embedded QuickJS runtime.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rquickjs::{Context, Ctx, Runtime};
use url::Url;

use super::helpers::install_pac_helpers;
use super::{PacEvaluator, PacScript};
use crate::config::{MAX_PAC_MEMORY_LIMIT, PAC_EVALUATION_TIMEOUT_MS};
use crate::error_handling::ProxyError;

/// Evaluates PAC scripts with QuickJS.
///
/// Each evaluation gets a fresh runtime with a memory limit, runs on the
/// blocking pool, and is interrupted once the timeout elapses.
#[derive(Debug, Clone)]
pub struct QuickJsPacEvaluator {
    timeout: Duration,
    memory_limit: usize,
}

impl QuickJsPacEvaluator {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_millis(PAC_EVALUATION_TIMEOUT_MS),
            memory_limit: MAX_PAC_MEMORY_LIMIT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for QuickJsPacEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PacEvaluator for QuickJsPacEvaluator {
    async fn evaluate(&self, script: &PacScript, url: &Url) -> Result<String, ProxyError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let content = script.content.clone();
        let target = url.as_str().to_string();
        let host = url.host_str().unwrap_or_default().to_string();
        let memory_limit = self.memory_limit;
        let deadline = Instant::now() + self.timeout;

        // QuickJS is blocking; the interrupt handler stops the script itself,
        // the tokio timeout bounds the wait
        let handle = tokio::task::spawn_blocking(move || {
            find_proxy_for_url(&content, &target, &host, memory_limit, deadline)
        });

        let result = tokio::time::timeout(self.timeout, handle)
            .await
            .map_err(|_| ProxyError::PacTimeout(timeout_ms))?
            .map_err(|e| ProxyError::PacEvaluation(format!("evaluation task failed: {e}")))?;

        match result {
            Err(ProxyError::PacEvaluation(_)) if Instant::now() >= deadline => {
                Err(ProxyError::PacTimeout(timeout_ms))
            }
            other => other,
        }
    }
}

fn find_proxy_for_url(
    script: &str,
    url: &str,
    host: &str,
    memory_limit: usize,
    deadline: Instant,
) -> Result<String, ProxyError> {
    let runtime = Runtime::new()
        .map_err(|e| ProxyError::PacEvaluation(format!("failed to create QuickJS runtime: {e}")))?;
    runtime.set_memory_limit(memory_limit);
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));
    let context = Context::full(&runtime)
        .map_err(|e| ProxyError::PacEvaluation(format!("failed to create QuickJS context: {e}")))?;

    let call = format!(
        "(function() {{ var r = FindProxyForURL({}, {}); return typeof r === 'string' ? r : null; }})()",
        js_string(url)?,
        js_string(host)?
    );

    context.with(|ctx| {
        install_pac_helpers(&ctx).map_err(|e| evaluation_error(&ctx, e))?;
        ctx.eval::<(), _>(script)
            .map_err(|e| evaluation_error(&ctx, e))?;
        ctx.eval::<Option<String>, _>(call.as_str())
            .map_err(|e| evaluation_error(&ctx, e))?
            .ok_or_else(|| {
                ProxyError::PacEvaluation("FindProxyForURL did not return a string".to_string())
            })
    })
}

/// Quotes `value` as a JavaScript string literal.
fn js_string(value: &str) -> Result<String, ProxyError> {
    serde_json::to_string(value).map_err(|e| ProxyError::PacEvaluation(e.to_string()))
}

fn evaluation_error(ctx: &Ctx<'_>, error: rquickjs::Error) -> ProxyError {
    if let rquickjs::Error::Exception = error {
        let caught = ctx.catch();
        let message = caught
            .as_exception()
            .and_then(|e| e.message())
            .unwrap_or_else(|| "uncaught exception".to_string());
        return ProxyError::PacEvaluation(message);
    }
    ProxyError::PacEvaluation(error.to_string())
}
