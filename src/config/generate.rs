pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# TELEMETRY AGGREGATOR CONFIGURATION
# =============================================================================
# Every section and field is optional; omitted values fall back to the
# defaults shown here.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/telemetry-aggregator/config.yml
#   3. /etc/telemetry-aggregator/config.yml
#
# Values may reference environment variables with $env{<NAME>}.

# =============================================================================
# ENDPOINT
# =============================================================================
# The telemetry endpoint queried for device readings. Each request is signed
# with SHA-256(path + secret + timestamp_ms).

endpoint:
  host: 127.0.0.1
  port: 3000
  path: /device/real/query
  # Shared secret; outside local testing, load it from an environment variable
  secret: interview_token_123
  # Per-request network timeout
  timeout: 10s

# =============================================================================
# POPULATION
# =============================================================================
# Devices are identified as <prefix><zero-padded index>, e.g. SN-000..SN-499.

population:
  count: 500
  prefix: SN-
  width: 3

# =============================================================================
# AGGREGATION
# =============================================================================

aggregation:
  # Devices per request (the endpoint accepts at most 10)
  batch_size: 10
  # Pause between batches; keeps the run under the endpoint's 1 req/s ceiling
  request_interval: 1s
  retry:
    # Extra attempts after a 429 or network error
    max_retries: 3
    delay: 2s

# =============================================================================
# SERVER
# =============================================================================
# HTTP trigger: GET /api/aggregate runs one aggregation and returns the report.

server:
  listen: 127.0.0.1:8080

# =============================================================================
# MOCK ENDPOINT
# =============================================================================
# Local stand-in for the telemetry endpoint (`telemetry-aggregator mock`).

mock:
  listen: 127.0.0.1:3000
  # Requests closer together than this are rejected with 429
  rate_limit_tolerance: 950ms
  max_batch_size: 10
"#
    .to_string()
}
