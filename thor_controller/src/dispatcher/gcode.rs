use crate::dispatcher::DispatchError;

/// Picks the step for a move from what the user typed.
///
/// Nothing typed (or only whitespace) means `default`; anything else must be
/// a finite number.
pub fn resolve_step(input: Option<&str>, default: f64) -> Result<f64, DispatchError> {
    let text = match input.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(text) => text,
    };

    text.parse::<f64>()
        .ok()
        .filter(|step| step.is_finite())
        .ok_or_else(|| DispatchError::InvalidStep {
            input: text.to_string(),
        })
}

/// Whole numbers keep one decimal (`10.0`), others print in shortest form.
pub fn format_position(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn manual_stepper_move(actuator: &str, position: f64, speed: f64) -> String {
    format!(
        "manual_stepper stepper={} move={} speed={}",
        actuator,
        format_position(position),
        speed
    )
}
