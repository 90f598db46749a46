/// Timezone sent when neither the config, the environment nor the system
/// names one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Picks the timezone identifier sent to the metrics services.
///
/// The configured value wins, then the `TZ` environment variable, then the
/// system zone, then [`DEFAULT_TIMEZONE`]. A `TZ` value in POSIX `:path` form
/// is reduced to the IANA name when it points into a zoneinfo directory.
pub fn resolve_timezone(
    configured: Option<&str>,
    tz_env: Option<&str>,
    system: Option<&str>,
) -> String {
    let configured = configured.map(str::trim).filter(|tz| !tz.is_empty());

    let from_env = tz_env
        .map(|tz| tz.trim().trim_start_matches(':'))
        .map(|tz| match tz.split_once("zoneinfo/") {
            Some((_, name)) => name,
            None => tz,
        })
        .filter(|tz| !tz.is_empty());

    let system = system.map(str::trim).filter(|tz| !tz.is_empty());

    configured
        .or(from_env)
        .or(system)
        .unwrap_or(DEFAULT_TIMEZONE)
        .to_string()
}

/// The process timezone, honoring a configured override.
pub fn local_timezone(configured: Option<&str>) -> String {
    let tz_env = std::env::var("TZ").ok();
    let system = match iana_time_zone::get_timezone() {
        Ok(tz) => Some(tz),
        Err(e) => {
            tracing::debug!(error = %e, "Could not read the system timezone");
            None
        }
    };
    resolve_timezone(configured, tz_env.as_deref(), system.as_deref())
}
