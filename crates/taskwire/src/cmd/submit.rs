use taskwire_codec::{build, SerializerRegistry, Value};
use taskwire_server::{Predicate, TaskClient, TaskClosure, TaskOp, Transform};

use crate::cmd::SubmitArgs;
use crate::exit::{codec_error, server_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_values, value_from_json, OutputFormat};

pub fn run(args: SubmitArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = SerializerRegistry::default();
    let serializer = build(&registry, &args.serializer)
        .map_err(|err| codec_error("invalid --serializer", err))?;

    let inputs = parse_inputs(&args.inputs)?;
    let closure = build_closure(&args)?;

    let outputs = TaskClient::connect(args.address.as_str())
        .map_err(|err| server_error("connect failed", err))?
        .with_serializer(serializer)
        .submit(args.split_index, &closure, &inputs)
        .map_err(|err| server_error("submit failed", err))?;

    print_values(&outputs, format);
    Ok(SUCCESS)
}

fn parse_inputs(raw: &[String]) -> CliResult<Vec<Value>> {
    raw.iter()
        .map(|text| {
            let json: serde_json::Value = serde_json::from_str(text)
                .map_err(|err| CliError::new(DATA_INVALID, format!("bad --input {text:?}: {err}")))?;
            Ok(value_from_json(&json))
        })
        .collect()
}

/// Stages apply in the fixed order emit, map-add, map-mul, filter-gt, take,
/// then sum/count.
fn build_closure(args: &SubmitArgs) -> CliResult<TaskClosure> {
    let mut main = Vec::new();

    if let Some(raw) = &args.emit {
        let json: serde_json::Value = serde_json::from_str(raw)
            .map_err(|err| CliError::new(DATA_INVALID, format!("bad --emit: {err}")))?;
        match json {
            serde_json::Value::Array(items) => {
                main.push(TaskOp::Emit(items.iter().map(value_from_json).collect()));
            }
            _ => return Err(CliError::new(USAGE, "--emit expects a JSON array")),
        }
    }
    if let Some(n) = args.map_add {
        main.push(TaskOp::Map(Transform::AddInt(n)));
    }
    if let Some(n) = args.map_mul {
        main.push(TaskOp::Map(Transform::MulInt(n)));
    }
    if let Some(n) = args.filter_gt {
        main.push(TaskOp::Filter(Predicate::IntGreaterThan(n)));
    }
    if let Some(n) = args.take {
        main.push(TaskOp::Take(n));
    }
    if args.sum {
        main.push(TaskOp::Sum);
    }
    if args.count {
        main.push(TaskOp::Count);
    }

    Ok(TaskClosure::new(main))
}
