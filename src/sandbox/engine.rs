//! Worker-side execution of one JavaScript unit.
//!
//! Each run gets a fresh engine context. Every global binding that is not on
//! the allow-list is deleted before user code is compiled, and `console` is
//! installed with a single `log` method writing into the run's own
//! [`CapturedOutput`]. The source is compiled by the realm's `AsyncFunction`
//! constructor as a strict-mode function body; its promise is driven to
//! completion by draining the job queue.

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::builtins::JsPromise;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue, NativeFunction, Source,
};
use boa_gc::{custom_trace, Finalize, Trace};

use crate::error::{Result, SandboxError};
use crate::sandbox::capture::CapturedOutput;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::limits::{ContextLimitsExt, ExecutionLimits};

/// Bindings the language itself needs; never removed.
const LANGUAGE_GLOBALS: &[&str] = &[
    "undefined",
    "NaN",
    "Infinity",
    "globalThis",
    "Symbol",
    "Error",
    "TypeError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "EvalError",
    "URIError",
    "AggregateError",
];

/// How the execution unit ended on the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    /// The unit resolved or rejected. A rejection has already been written
    /// to the output as an `Error: ...` line.
    Settled,
    /// The unit is waiting on a promise that nothing can resolve.
    Pending,
}

/// Run `source` to completion, writing console lines into `output`.
pub(crate) fn run_unit(
    source: &str,
    config: &SandboxConfig,
    output: &CapturedOutput,
) -> Result<Completion> {
    let mut context = Context::default();
    context.apply_limits(ExecutionLimits::from_config(config));

    let intrinsics =
        RealmIntrinsics::capture(&mut context).map_err(|e| init_error("capture intrinsics", &e))?;
    restrict_globals(&mut context, &config.allowed_globals)?;
    install_console(&mut context, output.clone(), intrinsics.stringify.clone())
        .map_err(|e| init_error("install console", &e))?;

    let value = match start_unit(&intrinsics.async_function, source, &mut context) {
        Ok(value) => value,
        Err(err) => {
            // The unit never compiled or hit an uncatchable engine limit.
            output.push(format_error_line(&describe_js_error(&err, &mut context)));
            return Ok(Completion::Settled);
        }
    };

    context.run_jobs();

    let Some(object) = value.as_object() else {
        return Ok(Completion::Settled);
    };
    let promise = JsPromise::from_object(object.clone())
        .map_err(|e| init_error("read unit promise", &e))?;

    match promise.state() {
        PromiseState::Fulfilled(_) => Ok(Completion::Settled),
        PromiseState::Rejected(reason) => {
            let message = error_message(&reason, &mut context);
            output.push(format_error_line(&message));
            Ok(Completion::Settled)
        }
        PromiseState::Pending => Ok(Completion::Pending),
    }
}

/// Realm objects taken before any global is removed, so neither the
/// allow-list nor user code can change what they refer to.
struct RealmIntrinsics {
    stringify: JsObject,
    async_function: JsObject,
}

impl RealmIntrinsics {
    fn capture(context: &mut Context) -> JsResult<Self> {
        let json = context.global_object().get(JsString::from("JSON"), context)?;
        let stringify = match json.as_object() {
            Some(json) => json.get(JsString::from("stringify"), context)?,
            None => JsValue::undefined(),
        };
        let async_function =
            context.eval(Source::from_bytes("(async function () {}).constructor"))?;
        Ok(Self {
            stringify: callable(&stringify, "JSON.stringify")?,
            async_function: callable(&async_function, "AsyncFunction")?,
        })
    }
}

fn callable(value: &JsValue, name: &str) -> JsResult<JsObject> {
    value.as_callable().cloned().ok_or_else(|| {
        JsNativeError::typ()
            .with_message(format!("{name} is not callable"))
            .into()
    })
}

/// Compile `source` as the body of a strict-mode async function and call it.
///
/// The body is parsed on its own, so it cannot close the function early and
/// reach script top level.
fn start_unit(async_function: &JsObject, source: &str, context: &mut Context) -> JsResult<JsValue> {
    let body = JsString::from(format!("\"use strict\";\n{source}"));
    let unit = async_function.call(&JsValue::undefined(), &[JsValue::from(body)], context)?;
    callable(&unit, "execution unit")?.call(&JsValue::undefined(), &[], context)
}

fn init_error(step: &str, err: &JsError) -> SandboxError {
    SandboxError::RuntimeInit(anyhow::anyhow!("failed to {}: {}", step, err))
}

/// Format a runtime failure as a transcript line.
pub(crate) fn format_error_line(message: &str) -> String {
    format!("Error: {message}")
}

/// Delete every global binding that is neither allow-listed nor required by
/// the language. Non-configurable bindings survive a failed `delete`.
fn restrict_globals(context: &mut Context, allowed: &[String]) -> Result<()> {
    let keep: Vec<&str> = LANGUAGE_GLOBALS
        .iter()
        .copied()
        .chain(allowed.iter().map(String::as_str))
        .collect();
    let keep = serde_json::to_string(&keep).map_err(|e| {
        SandboxError::RuntimeInit(anyhow::anyhow!("failed to encode allow-list: {}", e))
    })?;
    let prelude = format!(
        r#"(function (keep) {{
    var allowed = new Set(keep);
    Object.getOwnPropertyNames(globalThis).forEach(function (name) {{
        if (!allowed.has(name)) {{
            try {{ delete globalThis[name]; }} catch (e) {{}}
        }}
    }});
}})({keep});"#
    );
    context
        .eval(Source::from_bytes(&prelude))
        .map_err(|e| init_error("restrict globals", &e))?;
    Ok(())
}

#[derive(Finalize)]
struct ConsoleSink {
    output: CapturedOutput,
    stringify: JsObject,
}

// SAFETY: `stringify` is the only garbage-collected value held.
unsafe impl Trace for ConsoleSink {
    custom_trace!(this, mark, {
        mark(&this.stringify);
    });
}

/// Install a `console` object whose only method is `log`.
fn install_console(
    context: &mut Context,
    output: CapturedOutput,
    stringify: JsObject,
) -> JsResult<()> {
    let log = NativeFunction::from_copy_closure_with_captures(
        |_this: &JsValue, args: &[JsValue], sink: &ConsoleSink, ctx: &mut Context| {
            let line = args
                .iter()
                .map(|arg| render_log_argument(arg, &sink.stringify, ctx))
                .collect::<JsResult<Vec<_>>>()?
                .join(" ");
            sink.output.push(line);
            Ok(JsValue::undefined())
        },
        ConsoleSink { output, stringify },
    );
    let console = ObjectInitializer::new(context)
        .function(log, JsString::from("log"), 0)
        .build();
    context.register_global_property(JsString::from("console"), console, Attribute::all())
}

/// Render one `console.log` argument.
///
/// Objects and `null` go through `JSON.stringify(value, null, 2)`; a throw
/// from it (cycles, BigInt members) propagates to the caller of
/// `console.log`. Everything else, functions included, uses its string
/// conversion.
fn render_log_argument(
    value: &JsValue,
    stringify: &JsObject,
    context: &mut Context,
) -> JsResult<String> {
    let structured =
        value.is_null() || value.as_object().is_some_and(|obj| !obj.is_callable());
    if !structured {
        return Ok(string_of(value, context));
    }
    let text = stringify.call(
        &JsValue::undefined(),
        &[value.clone(), JsValue::null(), JsValue::from(2)],
        context,
    )?;
    if text.is_undefined() {
        // A `toJSON` returning undefined; joins as an empty string.
        return Ok(String::new());
    }
    Ok(string_of(&text, context))
}

fn string_of(value: &JsValue, context: &mut Context) -> String {
    match value.to_string(context) {
        Ok(text) => text.to_std_string_escaped(),
        Err(_) => value.display().to_string(),
    }
}

/// The message of a thrown or rejected value: its `message` property when it
/// has one, otherwise the value itself as a string.
fn error_message(reason: &JsValue, context: &mut Context) -> String {
    if let Some(object) = reason.as_object() {
        if let Ok(message) = object.get(JsString::from("message"), context) {
            if !message.is_undefined() {
                return string_of(&message, context);
            }
        }
    }
    string_of(reason, context)
}

fn describe_js_error(err: &JsError, context: &mut Context) -> String {
    match err.as_opaque() {
        Some(value) => error_message(value, context),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (Completion, Vec<String>) {
        let output = CapturedOutput::new();
        let completion = run_unit(source, &SandboxConfig::default(), &output).unwrap();
        (completion, output.lines())
    }

    #[test]
    fn test_logs_in_order() {
        let (completion, lines) = run("console.log(1); console.log('two', 3);");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines, vec!["1", "two 3"]);
    }

    #[test]
    fn test_objects_are_pretty_printed() {
        let (_, lines) = run("console.log({ a: 'x' }); console.log(null); console.log(undefined);");
        assert_eq!(lines, vec!["{\n  \"a\": \"x\"\n}", "null", "undefined"]);
    }

    #[test]
    fn test_undefined_members_follow_json_rules() {
        let (completion, lines) =
            run("console.log('a'); console.log({ a: 1, b: undefined }); console.log([undefined]);");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines, vec!["a", "{\n  \"a\": 1\n}", "[\n  null\n]"]);
    }

    #[test]
    fn test_structured_values_match_json_stringify() {
        let (_, lines) = run(
            r#"
console.log({ d: new Date(0) });
console.log({ f: () => 1, x: 2 });
console.log([NaN, 1]);
console.log({ toJSON() { return 'custom'; } });
"#,
        );
        assert_eq!(
            lines,
            vec![
                "{\n  \"d\": \"1970-01-01T00:00:00.000Z\"\n}",
                "{\n  \"x\": 2\n}",
                "[\n  null,\n  1\n]",
                "\"custom\"",
            ]
        );
    }

    #[test]
    fn test_cyclic_object_becomes_error_line() {
        let (completion, lines) =
            run("console.log('before'); const a = {}; a.self = a; console.log(a);");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "before");
        assert!(lines[1].starts_with("Error: "));
    }

    #[test]
    fn test_stringify_failure_is_catchable() {
        let (_, lines) = run(
            r#"
const a = {};
a.self = a;
try { console.log(a); } catch (e) { console.log(e instanceof TypeError); }
try { console.log({ n: 10n }); } catch (e) { console.log(e instanceof TypeError); }
"#,
        );
        assert_eq!(lines, vec!["true", "true"]);
    }

    #[test]
    fn test_bigint_member_becomes_error_line() {
        let (_, lines) = run("console.log({ n: 10n });");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: "));
    }

    #[test]
    fn test_user_json_cannot_change_rendering() {
        let (_, lines) = run("JSON.stringify = () => 'replaced'; console.log({ a: 1 });");
        assert_eq!(lines, vec!["{\n  \"a\": 1\n}"]);

        let config = SandboxConfig::builder().allowed_globals(["Math"]).build();
        let output = CapturedOutput::new();
        run_unit("console.log(typeof JSON, [2]);", &config, &output).unwrap();
        assert_eq!(output.lines(), vec!["undefined [\n  2\n]"]);
    }

    #[test]
    fn test_source_cannot_close_the_function_body() {
        let (completion, lines) =
            run("})(); console.log('escaped'); (async function () {");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: "));
        assert_ne!(lines[0], "escaped");
    }

    #[test]
    fn test_body_is_strict() {
        let (_, lines) = run("leaked = 1; console.log('unreachable');");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: "));
    }

    #[test]
    fn test_thrown_error_becomes_line() {
        let (completion, lines) = run("console.log('a'); throw new Error('boom');");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines, vec!["a", "Error: boom"]);
    }

    #[test]
    fn test_thrown_non_error_value() {
        let (_, lines) = run("throw 'plain';");
        assert_eq!(lines, vec!["Error: plain"]);
    }

    #[test]
    fn test_await_settles() {
        let (completion, lines) =
            run("const v = await Promise.resolve(7); console.log(v);");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines, vec!["7"]);
    }

    #[test]
    fn test_unresolvable_promise_is_pending() {
        let (completion, lines) = run("console.log('start'); await new Promise(() => {});");
        assert_eq!(completion, Completion::Pending);
        assert_eq!(lines, vec!["start"]);
    }

    #[test]
    fn test_syntax_error_becomes_line() {
        let (completion, lines) = run("console.log(;");
        assert_eq!(completion, Completion::Settled);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: "));
    }

    #[test]
    fn test_non_allowed_globals_are_gone() {
        let (_, lines) = run(
            "console.log(typeof Reflect, typeof Proxy, typeof JSON, typeof Math, typeof Error);",
        );
        assert_eq!(lines, vec!["undefined undefined object object function"]);
    }

    #[test]
    fn test_console_only_has_log() {
        let (_, lines) = run(
            "console.log(Object.getOwnPropertyNames(console).join(','), typeof console.error);",
        );
        assert_eq!(lines, vec!["log undefined"]);
    }

    #[test]
    fn test_loop_limit_stops_runaway_loop() {
        let config = SandboxConfig::builder().loop_iteration_limit(1_000).build();
        let output = CapturedOutput::new();
        let completion = run_unit("while (true) {}", &config, &output).unwrap();
        assert_eq!(completion, Completion::Settled);
        let lines = output.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error: "));
    }

    #[test]
    fn test_format_error_line() {
        assert_eq!(format_error_line("boom"), "Error: boom");
    }
}
