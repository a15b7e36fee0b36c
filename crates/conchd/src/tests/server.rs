//! End-to-end tests driving [`Server::tick`] against loopback clients.

use conch_eval::{EvalFault, Evaluator, ExpressionEvaluator, Namespace, OutputCapture, Value};
use mockall::mock;
use rstest::{fixture, rstest};

use crate::server::{Server, ServerSettings, TickError, VERSION_BINDING};
use conch_config::ListenEndpoint;

use super::support::{
    TestClient, expression_server, listening_server, loopback_settings, tick_until,
};

mock! {
    Eval {}
    impl Evaluator for Eval {
        fn evaluate(
            &mut self,
            command: &str,
            namespace: &mut Namespace,
            capture: &mut OutputCapture,
        ) -> Result<(), EvalFault>;
    }
}

#[fixture]
fn server() -> Server<ExpressionEvaluator> {
    expression_server()
}

#[rstest]
fn new_clients_receive_the_prompt(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect(&server);

    assert!(client.await_output(&mut server, ">>> "));
    assert_eq!(client.transcript(), ">>> ");
    assert_eq!(server.client_count(), 1);
}

#[rstest]
fn commands_are_answered_with_output_and_prompt(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    assert_eq!(client.exchange(&mut server, "1+1"), "2\n>>> ");
    assert_eq!(client.exchange(&mut server, "  x = 7  "), ">>> ");
    assert_eq!(client.exchange(&mut server, "x * 6"), "42\n>>> ");
}

#[rstest]
fn empty_lines_only_repeat_the_prompt(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    assert_eq!(client.exchange(&mut server, ""), ">>> ");
    assert_eq!(server.client_count(), 1);
}

#[rstest]
fn evaluation_errors_are_reported_in_session(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    let reply = client.exchange(&mut server, "missing + 1");

    assert!(reply.starts_with("error: "), "{reply:?}");
    assert!(reply.contains("missing"), "{reply:?}");
    assert!(reply.ends_with(">>> "));
    assert_eq!(server.client_count(), 1);
}

#[rstest]
fn long_operator_chains_are_rejected_without_dropping_the_client(
    mut server: Server<ExpressionEvaluator>,
) {
    let mut client = TestClient::connect_and_greet(&mut server);
    let command = format!("1{}", "+1".repeat(20_000));

    let reply = client.exchange(&mut server, &command);

    assert_eq!(reply, "error: invalid syntax: expression too complex\n>>> ");
    assert_eq!(client.exchange(&mut server, "1+1"), "2\n>>> ");
    assert_eq!(server.client_count(), 1);
}

#[rstest]
fn oversized_output_is_refused_in_session(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);
    client.exchange(&mut server, "s = 'a' * 1000000");
    let args = vec!["s"; 200].join(", ");

    let reply = client.exchange(&mut server, &format!("print({args})"));

    assert_eq!(reply, "error: output too large\n>>> ");
    assert_eq!(server.client_count(), 1);
}

#[rstest]
#[case("exit")]
#[case("quit")]
#[case("QUIT")]
#[case("  Exit  ")]
fn termination_words_close_the_session(
    mut server: Server<ExpressionEvaluator>,
    #[case] word: &str,
) {
    let mut client = TestClient::connect_and_greet(&mut server);

    client.send_line(word);

    assert!(client.await_close(&mut server), "session should close");
    assert_eq!(client.transcript(), "", "nothing is sent after a termination word");
    assert_eq!(server.client_count(), 0);
}

#[rstest]
fn namespace_is_shared_between_clients(mut server: Server<ExpressionEvaluator>) {
    let mut alice = TestClient::connect_and_greet(&mut server);
    let mut bob = TestClient::connect_and_greet(&mut server);

    assert_eq!(alice.exchange(&mut server, "greeting = \"hi\""), ">>> ");
    assert_eq!(bob.exchange(&mut server, "print(greeting + \" bob\")"), "hi bob\n>>> ");
    assert_eq!(
        server.namespace().get("greeting"),
        Some(&Value::Str("hi".to_owned()))
    );
}

#[rstest]
fn version_is_bound_for_every_session(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    let reply = client.exchange(&mut server, &format!("print({VERSION_BINDING})"));

    assert_eq!(reply, format!("{}\n>>> ", env!("CARGO_PKG_VERSION")));
}

#[rstest]
fn input_without_newline_is_never_evaluated(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    client.send(b"pending = 1");
    for _ in 0..20 {
        server.tick().expect("tick should succeed");
        client.collect();
    }

    assert_eq!(client.transcript(), "");
    assert!(!server.namespace().contains("pending"));
}

#[rstest]
fn disconnect_with_partial_input_discards_it(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);
    client.send(b"lost = 1");
    drop(client);

    assert!(tick_until(&mut server, |server| server.client_count() == 0));
    assert!(!server.namespace().contains("lost"));
}

#[rstest]
fn other_clients_survive_a_disconnect(mut server: Server<ExpressionEvaluator>) {
    let leaving = TestClient::connect_and_greet(&mut server);
    let mut staying = TestClient::connect_and_greet(&mut server);
    drop(leaving);

    assert!(tick_until(&mut server, |server| server.client_count() == 1));
    assert_eq!(staying.exchange(&mut server, "3 - 1"), "2\n>>> ");
}

#[rstest]
fn invalid_utf8_drops_only_that_client(mut server: Server<ExpressionEvaluator>) {
    let mut bad = TestClient::connect_and_greet(&mut server);
    let mut good = TestClient::connect_and_greet(&mut server);

    bad.send(&[0xff, 0xfe, b'\n']);

    assert!(bad.await_close(&mut server));
    assert!(bad.is_closed());
    assert_eq!(good.exchange(&mut server, "1"), "1\n>>> ");
}

#[rstest]
fn oversized_input_drops_the_client() {
    let settings = ServerSettings {
        max_command_bytes: 16,
        ..loopback_settings()
    };
    let mut server = listening_server(settings, ExpressionEvaluator::new());
    let mut client = TestClient::connect_and_greet(&mut server);

    client.send(&[b'a'; 64]);

    assert!(client.await_close(&mut server));
    assert_eq!(server.client_count(), 0);
}

#[rstest]
fn commands_larger_than_one_read_are_reassembled() {
    let settings = ServerSettings {
        read_chunk_size: 3,
        ..loopback_settings()
    };
    let mut server = listening_server(settings, ExpressionEvaluator::new());
    let mut client = TestClient::connect_and_greet(&mut server);

    assert_eq!(client.exchange(&mut server, "100 + 23"), "123\n>>> ");
}

#[rstest]
fn evaluator_faults_drop_the_client() {
    let mut evaluator = MockEval::new();
    evaluator
        .expect_evaluate()
        .times(1)
        .returning(|_, _, _| Err(EvalFault::new("backend lost")));
    let mut server = listening_server(loopback_settings(), evaluator);
    let mut client = TestClient::connect_and_greet(&mut server);

    client.send_line("anything");

    assert!(client.await_close(&mut server));
    assert_eq!(server.client_count(), 0);
}

#[rstest]
fn mock_evaluator_sees_trimmed_command_and_shared_namespace() {
    let mut evaluator = MockEval::new();
    evaluator
        .expect_evaluate()
        .withf(|command, namespace, _| command == "inspect" && namespace.contains(VERSION_BINDING))
        .times(1)
        .returning(|_, namespace, capture| {
            namespace.set("touched", Value::Bool(true));
            capture.stdout().line("touched");
            Ok(())
        });
    let mut server = listening_server(loopback_settings(), evaluator);
    let mut client = TestClient::connect_and_greet(&mut server);

    assert_eq!(client.exchange(&mut server, "\tinspect "), "touched\n>>> ");
    assert!(server.namespace().contains("touched"));
}

#[rstest]
fn one_connection_is_accepted_per_tick(mut server: Server<ExpressionEvaluator>) {
    let _first = TestClient::connect(&server);
    let _second = TestClient::connect(&server);

    let mut accepted = Vec::new();
    assert!(tick_until(&mut server, |server| {
        accepted.push(server.client_count());
        server.client_count() == 2
    }));
    assert!(accepted.first().is_some_and(|count| *count <= 1));
    assert!(
        accepted.windows(2).all(|pair| pair[1] <= pair[0] + 1),
        "client count jumped: {accepted:?}"
    );
}

#[rstest]
fn tick_reports_bind_failures() {
    let mut first = expression_server();
    let port = first.local_addr().expect("bound address").port();
    let settings = ServerSettings {
        listen: ListenEndpoint::tcp("127.0.0.1", port),
        ..ServerSettings::default()
    };
    let mut second = Server::new(settings, ExpressionEvaluator::new());

    let error = second.tick().expect_err("port is taken");

    assert!(matches!(error, TickError::Listener(_)));
    assert!(!second.is_listening());
    first.tick().expect("the bound server keeps working");
}

#[rstest]
fn shutdown_closes_clients_and_allows_rebinding(mut server: Server<ExpressionEvaluator>) {
    let mut client = TestClient::connect_and_greet(&mut server);

    server.shutdown();

    assert!(!server.is_listening());
    assert_eq!(server.client_count(), 0);
    client.collect();
    assert!(client.is_closed() || client.transcript().is_empty());
    server.tick().expect("a later tick binds again");
    assert!(server.is_listening());
}
