//! `netwatch medium`: medium validation without touching the topology.

use strum::IntoEnumIterator;
use tabled::Tabled;

use netwatch_core::{HealthAnalyzer, MediumType, MediumValidation};

use crate::cli::{GlobalOpts, MediumArgs, MediumCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Clone, Copy, serde::Serialize, Tabled)]
struct MediumRow {
    #[tabled(rename = "Medium")]
    medium_type: MediumType,
    #[tabled(rename = "Rated Mbps")]
    rated_speed_mbps: u32,
}

fn detail(v: &MediumValidation) -> String {
    [
        format!("Medium:      {}", v.medium_type),
        format!("Rated:       {} Mbps", v.expected_speed_mbps),
        format!("Measured:    {:.1} Mbps", v.actual_speed_mbps),
        format!("Utilization: {:.1}%", v.utilization_pct),
        format!("Valid:       {}", if v.is_valid { "yes" } else { "no" }),
        format!("Advice:      {}", v.recommendation),
    ]
    .join("\n")
}

pub fn handle(args: MediumArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        MediumCommand::Validate { speed_mbps, medium } => {
            if !speed_mbps.is_finite() || speed_mbps < 0.0 {
                return Err(CliError::Validation {
                    field: "speed_mbps".into(),
                    reason: format!("must be a non-negative number, got {speed_mbps}"),
                });
            }
            let medium_type: MediumType = util::parse_name("medium", &medium)?;
            let validation = HealthAnalyzer::validate_medium(speed_mbps, medium_type);
            let out = output::render_single(&global.output, &validation, detail, |v| {
                v.is_valid.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MediumCommand::Types => {
            let rows: Vec<MediumRow> = MediumType::iter()
                .map(|m| MediumRow {
                    medium_type: m,
                    rated_speed_mbps: m.rated_speed_mbps(),
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |r| *r,
                |r| r.medium_type.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
