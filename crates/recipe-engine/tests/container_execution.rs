//! End-to-end container execution scenarios
//!
//! These drive the full stack — container validation, input push,
//! connection propagation, sequential child execution, and output
//! aggregation — with callback executors standing in for the worker
//! process.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use recipe_engine::{
    Block, CallbackExecutor, Connection, Container, EngineError, Entry, ExecutionStatus,
    Parameter, ParameterType, ScriptError, ScriptExecutor, SyncCallbackExecutor,
};

/// Executor that returns a fixed output mapping for every script
fn fixed_outputs(outputs: HashMap<String, Value>) -> Arc<dyn ScriptExecutor> {
    Arc::new(SyncCallbackExecutor::new(move |_script, _inputs| {
        Ok(outputs.clone())
    }))
}

/// Executor that echoes its inputs back as outputs
fn echo_executor() -> Arc<dyn ScriptExecutor> {
    Arc::new(SyncCallbackExecutor::new(|_script, inputs| Ok(inputs)))
}

#[tokio::test]
async fn empty_execution_order_fails_before_any_child_runs() {
    let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let ran_flag = ran.clone();
    let executor = Arc::new(SyncCallbackExecutor::new(move |_script, _inputs| {
        ran_flag.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(HashMap::new())
    }));

    let mut child = Block::new("a", "A", "", "a.py", executor);
    child
        .base_mut()
        .add_input(Parameter::required("x", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container.add_child(Entry::Block(child)).unwrap();
    // execution order intentionally left empty

    let mut entry = Entry::Container(container);
    let err = entry.execute().await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(entry.status(), ExecutionStatus::Error);
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn values_flow_along_connections_between_children() {
    // B1 produces y = 5; B2 doubles whatever lands on its input y.
    let mut b1_outputs = HashMap::new();
    b1_outputs.insert("y".to_string(), json!(5));
    let mut b1 = Block::new("b1", "Producer", "", "produce.py", fixed_outputs(b1_outputs));
    b1.base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));

    let doubler = Arc::new(CallbackExecutor::new(|_script, inputs| async move {
        let y = inputs.get("y").and_then(|v| v.as_i64()).unwrap_or(0);
        let mut outputs = HashMap::new();
        outputs.insert("y".to_string(), json!(y * 2));
        Ok(outputs)
    }));
    let mut b2 = Block::new("b2", "Doubler", "", "double.py", doubler);
    b2.base_mut()
        .add_input(Parameter::optional("y", ParameterType::Integer));
    b2.base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container
        .base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));
    container.add_child(Entry::Block(b1)).unwrap();
    container.add_child(Entry::Block(b2)).unwrap();
    container
        .base_mut()
        .connect_parameter(Connection::new("b1", "y", "b2", "y"))
        .unwrap();
    container
        .set_execution_order(vec!["b1".to_string(), "b2".to_string()])
        .unwrap();

    let mut entry = Entry::Container(container);
    entry.execute().await.unwrap();

    assert_eq!(entry.status(), ExecutionStatus::Completed);
    let Entry::Container(container) = &entry else {
        unreachable!()
    };
    // B2 received y = 5 from B1 along the connection
    assert_eq!(
        container.child("b2").unwrap().base().input_value("y"),
        Some(&json!(5))
    );
    // The container's own output carries B2's result
    assert_eq!(entry.base().output_value("y"), Some(&json!(10)));
}

#[tokio::test]
async fn failing_child_aborts_and_names_the_culprit() {
    let mut b1_outputs = HashMap::new();
    b1_outputs.insert("y".to_string(), json!(5));
    let mut b1 = Block::new("b1", "Producer", "", "produce.py", fixed_outputs(b1_outputs));
    b1.base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));

    let failing = Arc::new(SyncCallbackExecutor::new(|script, _inputs| {
        Err(ScriptError::script(script, "boom"))
    }));
    let mut b2 = Block::new("b2", "Exploder", "", "explode.py", failing);
    b2.base_mut()
        .add_input(Parameter::optional("y", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container.add_child(Entry::Block(b1)).unwrap();
    container.add_child(Entry::Block(b2)).unwrap();
    container
        .set_execution_order(vec!["b1".to_string(), "b2".to_string()])
        .unwrap();

    let mut entry = Entry::Container(container);
    let err = entry.execute().await.unwrap_err();

    assert_eq!(entry.status(), ExecutionStatus::Error);
    let message = err.to_string();
    assert!(message.contains("b2"));
    assert!(message.contains("boom"));

    let Entry::Container(container) = &entry else {
        unreachable!()
    };
    assert_eq!(
        container.child("b1").unwrap().status(),
        ExecutionStatus::Completed
    );
    assert_eq!(
        container.child("b2").unwrap().status(),
        ExecutionStatus::Error
    );
}

#[tokio::test]
async fn container_inputs_reach_same_named_child_inputs() {
    let mut child = Block::new("c1", "Echo", "", "echo.py", echo_executor());
    child
        .base_mut()
        .add_input(Parameter::optional("threshold", ParameterType::Integer));
    child
        .base_mut()
        .add_output(Parameter::optional("threshold", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container
        .base_mut()
        .add_input(Parameter::optional("threshold", ParameterType::Integer));
    container
        .base_mut()
        .add_output(Parameter::optional("threshold", ParameterType::Integer));
    container.add_child(Entry::Block(child)).unwrap();
    container.set_execution_order(vec!["c1".to_string()]).unwrap();

    assert!(container.base_mut().set_input_value("threshold", json!(7)));

    let mut entry = Entry::Container(container);
    entry.execute().await.unwrap();

    // The value travelled container input -> child input -> child output
    // -> container output
    assert_eq!(entry.base().output_value("threshold"), Some(&json!(7)));
}

#[tokio::test]
async fn null_source_values_do_not_overwrite_target_inputs() {
    // B1 declares output y but never produces it
    let mut b1 = Block::new("b1", "Silent", "", "silent.py", fixed_outputs(HashMap::new()));
    b1.base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));

    let mut b2 = Block::new("b2", "Echo", "", "echo.py", echo_executor());
    b2.base_mut()
        .add_input(Parameter::optional("y", ParameterType::Integer).with_value(json!(1)));
    b2.base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container
        .base_mut()
        .add_output(Parameter::optional("y", ParameterType::Integer));
    container.add_child(Entry::Block(b1)).unwrap();
    container.add_child(Entry::Block(b2)).unwrap();
    container
        .base_mut()
        .connect_parameter(Connection::new("b1", "y", "b2", "y"))
        .unwrap();
    container
        .set_execution_order(vec!["b1".to_string(), "b2".to_string()])
        .unwrap();

    let mut entry = Entry::Container(container);
    entry.execute().await.unwrap();

    // B2 kept its original value because the source stayed null
    assert_eq!(entry.base().output_value("y"), Some(&json!(1)));
}

#[tokio::test]
async fn nested_containers_execute_recursively() {
    let mut inner_child = Block::new("leaf", "Leaf", "", "leaf.py", {
        let mut outputs = HashMap::new();
        outputs.insert("v".to_string(), json!("done"));
        fixed_outputs(outputs)
    });
    inner_child
        .base_mut()
        .add_output(Parameter::optional("v", ParameterType::String));

    let mut inner = Container::new("inner", "Inner", "");
    inner
        .base_mut()
        .add_output(Parameter::optional("v", ParameterType::String));
    inner.add_child(Entry::Block(inner_child)).unwrap();
    inner.set_execution_order(vec!["leaf".to_string()]).unwrap();

    let mut outer = Container::new("outer", "Outer", "");
    outer
        .base_mut()
        .add_output(Parameter::optional("v", ParameterType::String));
    outer.add_child(Entry::Container(inner)).unwrap();
    outer.set_execution_order(vec!["inner".to_string()]).unwrap();

    let mut entry = Entry::Container(outer);
    entry.execute().await.unwrap();

    assert_eq!(entry.status(), ExecutionStatus::Completed);
    assert_eq!(entry.base().output_value("v"), Some(&json!("done")));

    let Entry::Container(outer) = &entry else {
        unreachable!()
    };
    assert_eq!(
        outer.child("inner").unwrap().status(),
        ExecutionStatus::Completed
    );
}

#[tokio::test]
async fn rerunning_a_completed_container_overwrites_status() {
    let mut child = Block::new("c1", "Echo", "", "echo.py", echo_executor());
    child
        .base_mut()
        .add_input(Parameter::optional("x", ParameterType::Integer).with_value(json!(1)));

    let mut container = Container::new("parent", "Parent", "");
    container.add_child(Entry::Block(child)).unwrap();
    container.set_execution_order(vec!["c1".to_string()]).unwrap();

    let mut entry = Entry::Container(container);
    entry.execute().await.unwrap();
    assert_eq!(entry.status(), ExecutionStatus::Completed);

    entry.execute().await.unwrap();
    assert_eq!(entry.status(), ExecutionStatus::Completed);
}

#[tokio::test]
async fn auto_ordered_container_runs_dependencies_first() {
    let mut producer = Block::new("producer", "Producer", "", "produce.py", {
        let mut outputs = HashMap::new();
        outputs.insert("n".to_string(), json!(3));
        fixed_outputs(outputs)
    });
    producer
        .base_mut()
        .add_output(Parameter::optional("n", ParameterType::Integer));

    let mut consumer = Block::new("consumer", "Consumer", "", "consume.py", echo_executor());
    consumer
        .base_mut()
        .add_input(Parameter::optional("n", ParameterType::Integer));
    consumer
        .base_mut()
        .add_output(Parameter::optional("n", ParameterType::Integer));

    let mut container = Container::new("parent", "Parent", "");
    container
        .base_mut()
        .add_output(Parameter::optional("n", ParameterType::Integer));
    // Insert the consumer first so auto-ordering has to reorder
    container.add_child(Entry::Block(consumer)).unwrap();
    container.add_child(Entry::Block(producer)).unwrap();
    container
        .base_mut()
        .connect_parameter(Connection::new("producer", "n", "consumer", "n"))
        .unwrap();

    assert!(container.auto_set_execution_order());
    assert_eq!(
        container.execution_order(),
        ["producer".to_string(), "consumer".to_string()]
    );

    let mut entry = Entry::Container(container);
    entry.execute().await.unwrap();
    assert_eq!(entry.base().output_value("n"), Some(&json!(3)));
}
