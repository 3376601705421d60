use std::fmt;
use crate::drivers::params::{ActivityThreshold, ParamKey, ParameterSet, RATE_SMOOTHING_VALUES};
use crate::drivers::LinkError;
/// Numeric range plus quantization step for one field.
#[derive(Clone, Copy, Debug)]
pub struct NumericRule {
    pub key: ParamKey,
    pub low: f64,
    pub high: f64,
    pub step: f64,
    pub unit: &'static str,
}
const fn rule(key: ParamKey, low: f64, high: f64, step: f64, unit: &'static str) -> NumericRule {
    NumericRule {
        key,
        low,
        high,
        step,
        unit,
    }
}
/// Fields whose checks are a plain range followed by a fixed step.
pub const NUMERIC_RULES: [NumericRule; 13] = [
    rule(ParamKey::MaximumSensorRate, 50.0, 175.0, 5.0, "ppm"),
    rule(ParamKey::AtrialAmplitude, 0.0, 5.0, 0.1, "V"),
    rule(ParamKey::VentricularAmplitude, 0.0, 5.0, 0.1, "V"),
    rule(ParamKey::AtrialPulseWidth, 1.0, 30.0, 1.0, "ms"),
    rule(ParamKey::VentricularPulseWidth, 1.0, 30.0, 1.0, "ms"),
    rule(ParamKey::AtrialSensitivity, 0.0, 5.0, 0.1, "mV"),
    rule(ParamKey::VentricularSensitivity, 0.0, 5.0, 0.1, "mV"),
    rule(ParamKey::Arp, 150.0, 500.0, 10.0, "ms"),
    rule(ParamKey::Vrp, 150.0, 500.0, 10.0, "ms"),
    rule(ParamKey::Pvarp, 150.0, 500.0, 10.0, "ms"),
    rule(ParamKey::ReactionTime, 10.0, 50.0, 10.0, "s"),
    rule(ParamKey::ResponseFactor, 1.0, 16.0, 1.0, ""),
    rule(ParamKey::RecoveryTime, 2.0, 16.0, 1.0, "min"),
];
const LRL_RANGE: (f64, f64) = (30.0, 175.0);
const URL_RANGE: (f64, f64) = (50.0, 175.0);
const URL_STEP: f64 = 5.0;
const INCREMENT_TOLERANCE: f64 = 1e-6;
const HYSTERESIS_TOLERANCE: f64 = 0.1;
/// One violated rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    pub field: ParamKey,
    pub message: String,
}
impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
/// Every problem found in one pass over a parameter set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}
impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }
    pub fn has_issue_for(&self, field: ParamKey) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
    pub fn into_result(self) -> Result<(), LinkError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LinkError::Validation(self.messages()))
        }
    }
    fn push(&mut self, field: ParamKey, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }
}
fn in_range(value: f64, low: f64, high: f64) -> bool {
    (low..=high).contains(&value)
}
/// `value` is a whole number of `step`s, within floating point noise.
pub fn is_increment(value: f64, step: f64) -> bool {
    let ratio = value / step;
    (ratio - ratio.round()).abs() < INCREMENT_TOLERANCE
}
/// Lower Rate Limit steps are 5 ppm up to 50, 1 ppm up to 90, then 5 ppm again.
pub fn is_lrl_increment(value: f64) -> bool {
    if in_range(value, 30.0, 50.0) {
        is_increment(value, 5.0)
    } else if value > 50.0 && value <= 90.0 {
        is_increment(value, 1.0)
    } else if value > 90.0 && value <= 175.0 {
        is_increment(value, 5.0)
    } else {
        false
    }
}
fn parse(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}
/// Checks every present field and collects all violations.
///
/// Keys that are missing or blank are not checked. A range failure skips the
/// increment check for that field only.
pub fn validate_parameters(params: &ParameterSet) -> ValidationReport {
    let mut report = ValidationReport::default();
    let lrl = validate_lower_rate(params, &mut report);
    validate_upper_rate(params, lrl, &mut report);
    for rule in &NUMERIC_RULES {
        let Some(raw) = params.get(rule.key) else {
            continue;
        };
        let value = parse(raw);
        match value {
            Some(v) if in_range(v, rule.low, rule.high) => {
                if !is_increment(v, rule.step) {
                    report.push(
                        rule.key,
                        format!("{} must increase in steps of {} {}.", rule.key, rule.step, rule.unit)
                            .replace(" .", "."),
                    );
                }
            }
            _ => report.push(
                rule.key,
                format!("{} must be between {} and {} {}.", rule.key, rule.low, rule.high, rule.unit)
                    .replace(" .", "."),
            ),
        }
    }
    if let Some(raw) = params.get(ParamKey::RateSmoothing) {
        if !RATE_SMOOTHING_VALUES.contains(&raw) {
            report.push(
                ParamKey::RateSmoothing,
                format!(
                    "Rate Smoothing must be one of: {}.",
                    RATE_SMOOTHING_VALUES.join(", ")
                ),
            );
        }
    }
    if let Some(raw) = params.get(ParamKey::ActivityThreshold) {
        if ActivityThreshold::from_label(raw).is_none() {
            let labels: Vec<&str> = ActivityThreshold::ALL.iter().map(|t| t.label()).collect();
            report.push(
                ParamKey::ActivityThreshold,
                format!("Activity Threshold must be one of: {}.", labels.join(", ")),
            );
        }
    }
    validate_hysteresis(params, &mut report);
    if !report.is_valid() {
        log::debug!("parameter validation found {} issue(s)", report.issues.len());
    }
    report
}
/// Returns the Lower Rate Limit when it is present and inside its range.
fn validate_lower_rate(params: &ParameterSet, report: &mut ValidationReport) -> Option<f64> {
    let raw = params.get(ParamKey::LowerRateLimit)?;
    let (low, high) = LRL_RANGE;
    match parse(raw) {
        Some(v) if in_range(v, low, high) => {
            if !is_lrl_increment(v) {
                report.push(
                    ParamKey::LowerRateLimit,
                    "Lower Rate Limit increment invalid. Must follow:\n\
                     • 30–50: increments of 5\n\
                     • 50–90: increments of 1\n\
                     • 90–175: increments of 5",
                );
            }
            Some(v)
        }
        _ => {
            report.push(
                ParamKey::LowerRateLimit,
                "Lower Rate Limit must be between 30 and 175 ppm.",
            );
            None
        }
    }
}
fn validate_upper_rate(params: &ParameterSet, lrl: Option<f64>, report: &mut ValidationReport) {
    let Some(raw) = params.get(ParamKey::UpperRateLimit) else {
        return;
    };
    let (low, high) = URL_RANGE;
    match parse(raw) {
        Some(v) if in_range(v, low, high) => {
            if lrl.is_some_and(|lrl| v <= lrl) {
                report.push(
                    ParamKey::UpperRateLimit,
                    "Upper Rate Limit must be higher than Lower Rate Limit.",
                );
            }
            if !is_increment(v, URL_STEP) {
                report.push(
                    ParamKey::UpperRateLimit,
                    "Upper Rate Limit must increase in steps of 5 ppm.",
                );
            }
        }
        _ => report.push(
            ParamKey::UpperRateLimit,
            "Upper Rate Limit must be between 50 and 175 ppm.",
        ),
    }
}
fn validate_hysteresis(params: &ParameterSet, report: &mut ValidationReport) {
    let Some(raw) = params.get(ParamKey::Hysteresis) else {
        return;
    };
    if raw.eq_ignore_ascii_case("off") {
        return;
    }
    let Some(hysteresis) = parse(raw) else {
        report.push(
            ParamKey::Hysteresis,
            "Hysteresis must be 'Off' or a numeric value equal to LRL.",
        );
        return;
    };
    let matches_lrl = params
        .number(ParamKey::LowerRateLimit)
        .is_some_and(|lrl| (hysteresis - lrl).abs() <= HYSTERESIS_TOLERANCE);
    if !matches_lrl {
        report.push(
            ParamKey::Hysteresis,
            "Hysteresis must be 'Off' or equal to the Lower Rate Limit.",
        );
    }
}
