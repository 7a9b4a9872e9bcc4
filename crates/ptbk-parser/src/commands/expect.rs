//! EXPECT command
//!
//! Either an amount (`EXPECT MIN 2 LINES`) or a format (`EXPECT JSON`).
//! Both forms share the keyword, so one parser produces two command types.

use super::{wrong_command, DOCUMENTATION_URL};
use crate::error::{ParseError, Result};
use crate::registry::{CommandParser, CommandParserInput};
use ptbk_core::{
    Command, CommandType, CommandUsagePlace, ExpectFormat, ExpectationRange, ExpectationSign,
    ExpectationUnit, PipelineJson, PromptTemplateJson,
};

const NAME: &str = "EXPECT";

pub(crate) const EXPECT_COMMAND_PARSER: CommandParser = CommandParser {
    name: NAME,
    alias_names: &[],
    usage_places: &[CommandUsagePlace::PipelineTemplate],
    description: "Constraints the result must satisfy, checked after every attempt",
    documentation_url: DOCUMENTATION_URL,
    examples: &[
        "EXPECT MIN 2 LINES",
        "EXPECT MAX 5 LINES",
        "EXPECT EXACTLY 1 SENTENCE",
        "expect min 10 words",
        "EXPECT JSON",
    ],
    produces: &[CommandType::ExpectAmount, CommandType::ExpectFormat],
    parse,
    stringify,
    apply_to_pipeline: None,
    apply_to_template: Some(apply_to_template),
    take_from_pipeline: None,
    take_from_template: Some(take_from_template),
};

fn parse(input: &CommandParserInput<'_>) -> Result<Command> {
    match input.args.as_slice() {
        [format] if format.eq_ignore_ascii_case("JSON") => Ok(Command::ExpectFormat {
            format: ExpectFormat::Json,
        }),
        [sign, amount, unit] => {
            let sign = ExpectationSign::from_keyword(sign).ok_or_else(|| {
                ParseError::invalid(
                    NAME,
                    format!("Unknown expectation sign {sign:?}, expected MIN, MAX or EXACTLY"),
                )
            })?;

            let amount: u32 = amount.parse().map_err(|_| {
                ParseError::invalid(NAME, format!("Invalid amount {amount:?}"))
            })?;

            let unit = ExpectationUnit::from_keyword(unit).ok_or_else(|| {
                ParseError::invalid(NAME, format!("Unknown expectation unit {unit:?}"))
            })?;

            Ok(Command::ExpectAmount { sign, unit, amount })
        }
        _ => Err(ParseError::invalid(
            NAME,
            format!(
                "expected `EXPECT MIN|MAX|EXACTLY <amount> <unit>` or `EXPECT JSON`, got {:?}",
                input.raw
            ),
        )),
    }
}

fn stringify(command: &Command) -> Result<String> {
    match command {
        Command::ExpectAmount { sign, unit, amount } => Ok(format!(
            "EXPECT {} {amount} {}",
            sign.as_keyword(),
            unit.as_str()
        )),
        Command::ExpectFormat { format } => Ok(format!("EXPECT {}", format.as_str())),
        other => Err(wrong_command(NAME, other)),
    }
}

/// Resolve one bound of a range, refusing to redefine it
fn merge_bound(
    bound: Option<u32>,
    amount: u32,
    label: &str,
    unit: ExpectationUnit,
) -> Result<Option<u32>> {
    match bound {
        Some(existing) if existing != amount => Err(ParseError::conflict(
            NAME,
            format!("{label} {unit} is already {existing}, can not redefine it to {amount}"),
        )),
        _ => Ok(Some(amount)),
    }
}

fn apply_to_template(
    command: &Command,
    template: &mut PromptTemplateJson,
    _pipeline: &mut PipelineJson,
) -> Result<()> {
    match command {
        Command::ExpectAmount { sign, unit, amount } => {
            let mut range = template.expectations.get(unit).cloned().unwrap_or_default();

            if matches!(sign, ExpectationSign::Minimum | ExpectationSign::Exactly) {
                range.min = merge_bound(range.min, *amount, "minimum of", *unit)?;
            }
            if matches!(sign, ExpectationSign::Maximum | ExpectationSign::Exactly) {
                range.max = merge_bound(range.max, *amount, "maximum of", *unit)?;
            }

            if let ExpectationRange {
                min: Some(min),
                max: Some(max),
            } = range
            {
                if min > max {
                    return Err(ParseError::conflict(
                        NAME,
                        format!("minimum {min} {unit} is greater than maximum {max} {unit}"),
                    ));
                }
            }

            template.expectations.insert(*unit, range);
            Ok(())
        }
        Command::ExpectFormat { format } => match template.expect_format {
            Some(existing) if existing != *format => Err(ParseError::conflict(
                NAME,
                format!(
                    "template already expects {}, can not also expect {}",
                    existing.as_str(),
                    format.as_str()
                ),
            )),
            _ => {
                template.expect_format = Some(*format);
                Ok(())
            }
        },
        other => Err(wrong_command(NAME, other)),
    }
}

fn take_from_template(template: &PromptTemplateJson, _pipeline: &PipelineJson) -> Vec<Command> {
    let mut commands = Vec::new();

    for (unit, range) in &template.expectations {
        match (range.min, range.max) {
            (Some(min), Some(max)) if min == max => commands.push(Command::ExpectAmount {
                sign: ExpectationSign::Exactly,
                unit: *unit,
                amount: min,
            }),
            (min, max) => {
                if let Some(amount) = min {
                    commands.push(Command::ExpectAmount {
                        sign: ExpectationSign::Minimum,
                        unit: *unit,
                        amount,
                    });
                }
                if let Some(amount) = max {
                    commands.push(Command::ExpectAmount {
                        sign: ExpectationSign::Maximum,
                        unit: *unit,
                        amount,
                    });
                }
            }
        }
    }

    if let Some(format) = template.expect_format {
        commands.push(Command::ExpectFormat { format });
    }

    commands
}
