use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use types::SchedulingPolicy;

const PREFIX: &str = "UNISCHEDULE__";

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub remote: Option<RemoteConfig>,
    pub policy: SchedulingPolicy,
    /// JSON file with `courses`, `venues` and `examCourses` loaded into the store at startup.
    pub seed_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// `lookup` receives full variable names, e.g. `UNISCHEDULE__SERVER__PORT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get =
            |key: &str| lookup(&format!("{PREFIX}{key}")).filter(|v| !v.trim().is_empty());

        let port = parse_opt(get("SERVER__PORT"), "SERVER__PORT")?.unwrap_or(8080);

        let remote = match get("REMOTE__URL") {
            Some(url) => Some(RemoteConfig {
                url,
                timeout: Duration::from_secs(
                    parse_opt(get("REMOTE__TIMEOUT_SECS"), "REMOTE__TIMEOUT_SECS")?.unwrap_or(30),
                ),
            }),
            None => None,
        };

        let mut policy = SchedulingPolicy::default();
        set(&mut policy.max_consecutive_hours, &get, "POLICY__MAX_CONSECUTIVE_HOURS")?;
        if let Some(raw) = get("POLICY__MAX_CLASSES_PER_DAY") {
            policy.max_classes_per_day = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse(&raw, "POLICY__MAX_CLASSES_PER_DAY")?)
            };
        }
        set(&mut policy.venue_overflow_tolerance, &get, "POLICY__VENUE_OVERFLOW_TOLERANCE")?;
        set(&mut policy.exam_overflow_tolerance, &get, "POLICY__EXAM_OVERFLOW_TOLERANCE")?;
        set(&mut policy.max_exam_window_days, &get, "POLICY__MAX_EXAM_WINDOW_DAYS")?;
        set(&mut policy.lecturer_overload_threshold, &get, "POLICY__LECTURER_OVERLOAD_THRESHOLD")?;
        set(&mut policy.lecturer_warning_threshold, &get, "POLICY__LECTURER_WARNING_THRESHOLD")?;
        set(
            &mut policy.fallback.redistribute_lecturer_load,
            &get,
            "POLICY__REDISTRIBUTE_LECTURER_LOAD",
        )?;

        let seed_path = get("DATA__SEED_PATH").map(PathBuf::from);

        Ok(Self {
            port,
            remote,
            policy,
            seed_path,
        })
    }
}

fn parse<T>(raw: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{PREFIX}{key} has invalid value `{raw}`"))
}

/// Overwrites `slot` when `key` is set.
fn set<T>(slot: &mut T, get: impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(v) = parse_opt(get(key), key)? {
        *slot = v;
    }
    Ok(())
}

fn parse_opt<T>(raw: Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|r| parse(&r, key)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("{PREFIX}{k}"), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let c = config(&[]).unwrap();
        assert_eq!(c.port, 8080);
        assert!(c.remote.is_none());
        assert!(c.seed_path.is_none());
        assert_eq!(c.policy, SchedulingPolicy::default());
    }

    #[test]
    fn overrides_are_applied() {
        let c = config(&[
            ("SERVER__PORT", "9000"),
            ("REMOTE__URL", "http://solver:7000/generate"),
            ("REMOTE__TIMEOUT_SECS", "5"),
            ("POLICY__MAX_CLASSES_PER_DAY", "none"),
            ("POLICY__MAX_CONSECUTIVE_HOURS", "3"),
            ("POLICY__EXAM_OVERFLOW_TOLERANCE", "0.2"),
            ("POLICY__MAX_EXAM_WINDOW_DAYS", "30"),
            ("DATA__SEED_PATH", "/etc/unischedule/seed.json"),
        ])
        .unwrap();
        assert_eq!(c.port, 9000);
        let remote = c.remote.unwrap();
        assert_eq!(remote.timeout, Duration::from_secs(5));
        assert_eq!(c.policy.max_classes_per_day, None);
        assert_eq!(c.policy.max_consecutive_hours, 3);
        assert_eq!(c.policy.exam_overflow_tolerance, 0.2);
        assert_eq!(c.policy.max_exam_window_days, 30);
        assert_eq!(c.seed_path, Some(PathBuf::from("/etc/unischedule/seed.json")));
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("SERVER__PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("UNISCHEDULE__SERVER__PORT"));
    }
}
