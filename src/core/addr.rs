use log::warn;

use crate::core::types::Endpoint;

/// Parses the raw candidate-endpoint string of a deletion event.
///
/// Accepts "host:port" entries separated by commas, semicolons, or
/// whitespace. Order is preserved: it defines the discovery scan order.
/// Malformed entries are skipped with a warning and never abort parsing.
pub fn parse_endpoints(raw: &str) -> Vec<Endpoint> {
    raw.split([',', ';'])
        .flat_map(str::split_whitespace)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<Endpoint>() {
            Ok(endpoint) => Some(endpoint),
            Err(err) => {
                warn!("Skipping malformed endpoint '{}': {}", token, err);
                None
            }
        })
        .collect()
}
