//! Pure structural validators
//!
//! Character-class and shape checks used as helper predicates by the
//! policy validator. No store access, no side effects; failures come
//! back as user-facing messages.

use crate::models::workload::{EnvVar, MetricSpec};
use once_cell::sync::Lazy;
use regex::Regex;

/// C-identifier style env var names, extended with `.` and `-`.
static ENV_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-._a-zA-Z][-._a-zA-Z0-9]*$").expect("env name pattern"));

/// DNS-1123 label: lowercase alphanumerics and '-', starts and ends
/// alphanumeric.
static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("dns label pattern"));

const DNS1123_MAX_LEN: usize = 63;

/// Validate every declared environment entry.
pub fn validate_env_entries(env: &[EnvVar]) -> Result<(), String> {
    for entry in env {
        if entry.name.is_empty() {
            return Err("env name must not be empty".to_string());
        }
        if !ENV_NAME.is_match(&entry.name) {
            return Err(format!(
                "env name {} is invalid: must consist of alphabetic characters, \
                 digits, '_', '-', or '.', and must not start with a digit",
                entry.name
            ));
        }
        if !entry.value.is_empty() && entry.value_from.is_some() {
            return Err(format!(
                "env {} declares both a value and a value source",
                entry.name
            ));
        }
        if let Some(source) = &entry.value_from {
            match &source.secret_key_ref {
                Some(sel) if sel.name.is_empty() || sel.key.is_empty() => {
                    return Err(format!(
                        "env {}'s secret reference needs both a secret name and a key",
                        entry.name
                    ));
                }
                Some(_) => {}
                None => {
                    return Err(format!("env {} declares an empty value source", entry.name));
                }
            }
        }
    }
    Ok(())
}

/// Validate a DNS-1123 label (used for volume claim names).
pub fn validate_dns1123_label(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > DNS1123_MAX_LEN {
        return Err(format!(
            "the name {} must be not empty and no more than {} characters",
            name, DNS1123_MAX_LEN
        ));
    }
    if !DNS1123_LABEL.is_match(name) {
        return Err(format!(
            "the name {} is not a DNS-1123 label: it must consist of lower case \
             alphanumeric characters or '-', and must start and end with an \
             alphanumeric character (e.g. 'my-name' or '123-abc')",
            name
        ));
    }
    Ok(())
}

/// Validate declared autoscaling metric specs. Returns one message per
/// structural problem found.
pub fn validate_metrics(metrics: &[MetricSpec]) -> Vec<String> {
    let mut errors = Vec::new();

    for (i, metric) in metrics.iter().enumerate() {
        if metric.metric_name().is_empty() {
            errors.push(format!("metrics[{}]: metric name must not be empty", i));
            continue;
        }
        match metric {
            MetricSpec::Object { target_value, .. }
            | MetricSpec::External { target_value, .. } => {
                if target_value.is_empty() {
                    errors.push(format!("metrics[{}]: target value must not be empty", i));
                }
            }
            MetricSpec::Pods {
                target_average_value,
                ..
            } => {
                if target_average_value.is_empty() {
                    errors.push(format!(
                        "metrics[{}]: target average value must not be empty",
                        i
                    ));
                }
            }
            MetricSpec::Resource {
                target_average_utilization,
                ..
            } => match target_average_utilization {
                None => errors.push(format!(
                    "metrics[{}]: resource metrics need a target average utilization",
                    i
                )),
                Some(pct) if *pct < 1 || *pct > 100 => errors.push(format!(
                    "metrics[{}]: target average utilization must be between 1 and 100",
                    i
                )),
                Some(_) => {}
            },
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workload::{EnvVarSource, SecretKeySelector};

    #[test]
    fn env_names_accept_identifier_charset() {
        let ok = vec![
            EnvVar::literal("FOO", "1"),
            EnvVar::literal("my.key-2", "x"),
            EnvVar::literal("_private", "x"),
        ];
        assert!(validate_env_entries(&ok).is_ok());
    }

    #[test]
    fn env_names_reject_bad_charset() {
        assert!(validate_env_entries(&[EnvVar::literal("FOO BAR", "1")]).is_err());
        assert!(validate_env_entries(&[EnvVar::literal("1LEADING", "1")]).is_err());
        assert!(validate_env_entries(&[EnvVar::literal("", "1")]).is_err());
    }

    #[test]
    fn env_rejects_value_and_source_together() {
        let entry = EnvVar {
            name: "TOKEN".to_string(),
            value: "literal".to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: "creds".to_string(),
                    key: "token".to_string(),
                }),
            }),
        };
        assert!(validate_env_entries(&[entry]).is_err());
    }

    #[test]
    fn dns_label_rules() {
        assert!(validate_dns1123_label("my-volume").is_ok());
        assert!(validate_dns1123_label("123-abc").is_ok());
        assert!(validate_dns1123_label("My_Volume").is_err());
        assert!(validate_dns1123_label("-leading").is_err());
        assert!(validate_dns1123_label("").is_err());
        assert!(validate_dns1123_label(&"a".repeat(64)).is_err());
        assert!(validate_dns1123_label(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn metric_validation_catches_empty_targets() {
        let metrics = vec![
            MetricSpec::Pods {
                metric_name: "rps".to_string(),
                target_average_value: String::new(),
            },
            MetricSpec::Resource {
                name: "cpu".to_string(),
                target_average_utilization: Some(150),
            },
        ];
        let errors = validate_metrics(&metrics);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn valid_metrics_pass() {
        let metrics = vec![MetricSpec::Resource {
            name: "cpu".to_string(),
            target_average_utilization: Some(75),
        }];
        assert!(validate_metrics(&metrics).is_empty());
    }
}
