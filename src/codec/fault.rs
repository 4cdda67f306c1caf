/// Known fault-type suffixes and the failure mode each one reports
pub const FAULT_MEANINGS: &[(&str, &str)] = &[
    ("00", "General failure / no sub-type"),
    ("11", "Circuit short to ground"),
    ("12", "Circuit short to battery/positive"),
    ("13", "Circuit open"),
    ("14", "Circuit short to ground or open"),
    ("15", "Circuit short to battery or open"),
    ("16", "Circuit voltage below threshold"),
    ("17", "Circuit voltage above threshold"),
    ("18", "Circuit current below threshold"),
    ("19", "Circuit current above threshold"),
    ("21", "Signal stuck low"),
    ("22", "Signal stuck high"),
    ("23", "Signal intermittent/erratic"),
    ("28", "Signal implausible"),
    ("29", "Signal invalid"),
    ("62", "Actuator stuck"),
    ("63", "Actuator stuck open"),
    ("64", "Actuator stuck closed"),
    ("71", "Mechanical failure"),
    ("72", "Calibration/parameter not learned"),
    ("73", "Performance/range issue"),
    ("7A", "Module not configured / software incompatible"),
    ("7F", "Security/component protection fault"),
];

/// Looks up the failure mode for a two-hex-digit fault suffix
///
/// The lookup ignores case. Unknown suffixes are not an error.
///
/// # Examples
///
/// ```
/// use dtc_harvest::codec::fault_meaning;
///
/// assert_eq!(fault_meaning("13"), Some("Circuit open"));
/// assert_eq!(fault_meaning("7a"), Some("Module not configured / software incompatible"));
/// assert_eq!(fault_meaning("99"), None);
/// ```
pub fn fault_meaning(suffix: &str) -> Option<&'static str> {
    FAULT_MEANINGS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(suffix))
        .map(|(_, meaning)| *meaning)
}
