//! OEE computation, spec.md §4.7: Availability × Performance × Quality,
//! per shift, per machine.

/// Raw inputs for one machine's OEE over one shift window, §4.7.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OeeInputs {
    pub planned_production_time_hours: f64,
    pub run_time_hours: f64,
    pub ideal_cycle_time_hours: f64,
    pub total_parts: f64,
    pub good_parts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OeeResult {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub availability_loss: f64,
    pub performance_loss: f64,
    pub quality_loss: f64,
}

/// Compute Availability/Performance/Quality/OEE, §4.7. Any ratio with a
/// zero denominator is reported as 0.0 rather than NaN/infinity, since a
/// shift with no planned time or no parts produced has no meaningful rate.
pub fn compute(inputs: OeeInputs) -> OeeResult {
    let availability = if inputs.planned_production_time_hours > 0.0 {
        (inputs.run_time_hours / inputs.planned_production_time_hours).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let performance = if inputs.run_time_hours > 0.0 {
        ((inputs.ideal_cycle_time_hours * inputs.total_parts) / inputs.run_time_hours).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let quality = if inputs.total_parts > 0.0 {
        (inputs.good_parts / inputs.total_parts).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let oee = availability * performance * quality;

    OeeResult {
        availability,
        performance,
        quality,
        oee,
        availability_loss: 1.0 - availability,
        performance_loss: 1.0 - performance,
        quality_loss: 1.0 - quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_shift_yields_oee_one() {
        let result = compute(OeeInputs {
            planned_production_time_hours: 8.0,
            run_time_hours: 8.0,
            ideal_cycle_time_hours: 0.1,
            total_parts: 80.0,
            good_parts: 80.0,
        });
        assert!((result.oee - 1.0).abs() < 1e-9);
        assert_eq!(result.availability_loss, 0.0);
    }

    #[test]
    fn downtime_reduces_availability() {
        let result = compute(OeeInputs {
            planned_production_time_hours: 8.0,
            run_time_hours: 4.0,
            ideal_cycle_time_hours: 0.1,
            total_parts: 40.0,
            good_parts: 40.0,
        });
        assert_eq!(result.availability, 0.5);
    }

    #[test]
    fn scrap_reduces_quality_and_oee() {
        let result = compute(OeeInputs {
            planned_production_time_hours: 8.0,
            run_time_hours: 8.0,
            ideal_cycle_time_hours: 0.1,
            total_parts: 80.0,
            good_parts: 72.0,
        });
        assert_eq!(result.quality, 0.9);
        assert!(result.oee < 1.0);
    }

    #[test]
    fn zero_planned_time_yields_zero_availability_not_nan() {
        let result = compute(OeeInputs {
            planned_production_time_hours: 0.0,
            run_time_hours: 0.0,
            ideal_cycle_time_hours: 0.1,
            total_parts: 0.0,
            good_parts: 0.0,
        });
        assert_eq!(result.availability, 0.0);
        assert_eq!(result.oee, 0.0);
        assert!(!result.oee.is_nan());
    }
}
