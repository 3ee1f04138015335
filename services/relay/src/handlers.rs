//! Plain HTTP handlers.

/// Health check for load balancers and uptime probes.
pub async fn health() -> &'static str {
    "Gemini Live relay is running."
}
