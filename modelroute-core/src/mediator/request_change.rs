//! Single-target request rewriting

use super::{
    metadata_for, parse_config, BypassReason, InboundRequest, MediationError, MediationOutcome,
    MediatorSettings, ParsedConfig, RewrittenRequest,
};
use crate::adapter::ProtocolAdapter;
use crate::config::{parse_request_change, ConfigValidator, RequestChangeConfig, RequestChangeTarget};
use crate::protocol::{PayloadExtractor, RoutingMetadata};
use crate::routing::{EndpointResolver, RejectReason, Resolution};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Rewrites every request for one fixed target per environment
pub struct RequestChangeMediator {
    target: ParsedConfig<RequestChangeTarget>,
    resolver: Arc<EndpointResolver>,
    adapter: Arc<ProtocolAdapter>,
    settings: MediatorSettings,
}

impl RequestChangeMediator {
    /// Parse `raw_config` once: either a per-environment policy or a direct target
    pub fn new(raw_config: &str, resolver: Arc<EndpointResolver>, adapter: Arc<ProtocolAdapter>) -> Self {
        let target = parse_config(raw_config, parse_request_change);
        if let Err(e) = &target {
            error!(error = %e, "request-change config rejected, requests will fail");
        }
        Self::with_target(target, resolver, adapter)
    }

    /// Use an already-built direct target
    pub fn direct(config: RequestChangeConfig, resolver: Arc<EndpointResolver>, adapter: Arc<ProtocolAdapter>) -> Self {
        let target = ConfigValidator::new()
            .validate_request_change(&config)
            .map(|()| Some(RequestChangeTarget::Direct(config)))
            .map_err(|e| MediationError::Validation(Arc::new(e)));
        Self::with_target(target, resolver, adapter)
    }

    fn with_target(
        target: ParsedConfig<RequestChangeTarget>,
        resolver: Arc<EndpointResolver>,
        adapter: Arc<ProtocolAdapter>,
    ) -> Self {
        Self {
            target,
            resolver,
            adapter,
            settings: MediatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MediatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn mediate(&self, request: &InboundRequest) -> Result<MediationOutcome, MediationError> {
        match &self.target {
            Ok(Some(RequestChangeTarget::Policy(policy))) => {
                let selection = match self
                    .resolver
                    .resolve_single(policy, request.environment, &request.scope.key)
                {
                    Resolution::Routed(selection) => selection,
                    Resolution::Reject(RejectReason::NoPolicyForEnvironment) => {
                        debug!(env = %request.environment, "no target for environment, bypassing");
                        return Ok(MediationOutcome::Bypass(BypassReason::NoPolicyForEnvironment));
                    }
                    Resolution::Reject(reason) => return Ok(MediationOutcome::Reject(reason)),
                };

                let Some(message) = PayloadExtractor::extract_non_blank(&request.payload) else {
                    debug!("no user message, forwarding payload unchanged");
                    return Ok(MediationOutcome::Bypass(BypassReason::NoUserMessage));
                };

                let outbound = self
                    .adapter
                    .adapt(&selection.endpoint, &message, &request.scope, self.settings.params)
                    .inspect_err(|e| error!(error = %e, endpoint_id = %selection.endpoint.endpoint_id, "failed to adapt request"))?;

                let metadata = metadata_for(&selection, &outbound, self.settings.timeout_ms);
                debug!(request_id = %metadata.request_id, endpoint_id = %metadata.endpoint_id, "request rewritten");
                Ok(MediationOutcome::Rewritten(Box::new(RewrittenRequest {
                    request: outbound,
                    metadata,
                })))
            }
            Ok(Some(RequestChangeTarget::Direct(config))) => {
                let Some(message) = PayloadExtractor::extract_non_blank(&request.payload) else {
                    debug!("no user message, forwarding payload unchanged");
                    return Ok(MediationOutcome::Bypass(BypassReason::NoUserMessage));
                };

                let outbound = self
                    .adapter
                    .adapt_direct(config, &message)
                    .inspect_err(|e| error!(error = %e, endpoint = %config.endpoint, "failed to adapt request"))?;

                let metadata = RoutingMetadata {
                    request_id: Uuid::new_v4(),
                    endpoint_id: config.endpoint.clone(),
                    provider: outbound.provider,
                    model: outbound.model.clone(),
                    category: None,
                    used_fallback: false,
                    timeout_ms: config.timeout,
                    suspend_duration_ms: 0,
                    request_changed: true,
                };
                debug!(request_id = %metadata.request_id, provider = %metadata.provider, "request rewritten");
                Ok(MediationOutcome::Rewritten(Box::new(RewrittenRequest {
                    request: outbound,
                    metadata,
                })))
            }
            Ok(None) => Ok(MediationOutcome::Bypass(BypassReason::EmptyConfig)),
            Err(e) => Err(e.clone()),
        }
    }
}
