//! End-to-end invocations with captured events of every supported shape.

use base64::{engine::general_purpose::STANDARD, Engine};
use lambda_chop::{wrap, Error, Request, ResponseWriter, SourceEvent};
use lambda_http::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use serde_json::{json, Value};
use std::{cell::RefCell, collections::BTreeMap};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

fn api_gateway_proxy_event() -> Value {
    json!({
        "resource": "/{proxy+}",
        "path": "/resource/",
        "httpMethod": "GET",
        "headers": {
            "X-Custom-Header1": "v1",
            "X-Custom-Header2": "v3"
        },
        "multiValueHeaders": {
            "X-Custom-Header1": ["v1"],
            "X-Custom-Header2": ["v2", "v3"]
        },
        "queryStringParameters": {"q1": "v1", "q2": "v3"},
        "multiValueQueryStringParameters": {
            "q1": ["v1"],
            "q2": ["v2", "v3"]
        },
        "pathParameters": {"proxy": "resource"},
        "stageVariables": null,
        "requestContext": {
            "resourcePath": "/{proxy+}",
            "httpMethod": "GET",
            "path": "/dev/resource/",
            "protocol": "HTTP/1.1",
            "apiId": "apiid"
        },
        "body": "body",
        "isBase64Encoded": false
    })
}

fn api_gateway_v2_http_event() -> Value {
    json!({
        "version": "2.0",
        "routeKey": "$default",
        "rawPath": "/resource/",
        "rawQueryString": "q1=v1&q2=v2&q2=v3",
        "headers": {
            "x-custom-header1": "v1",
            "x-custom-header2": "v2"
        },
        "queryStringParameters": {"q1": "v1", "q2": "v2,v3"},
        "requestContext": {
            "apiId": "apiid",
            "http": {
                "method": "GET",
                "path": "/resource",
                "protocol": "HTTP/1.1"
            }
        },
        "body": "body",
        "isBase64Encoded": false
    })
}

fn alb_single_value_event() -> Value {
    json!({
        "requestContext": {"elb": {"targetGroupArn": "arn"}},
        "httpMethod": "GET",
        "path": "/resource/",
        "queryStringParameters": {"q1": "v1", "q2": "v2"},
        "headers": {
            "x-custom-header1": "v1",
            "x-custom-header2": "v2"
        },
        "body": "body",
        "isBase64Encoded": false
    })
}

fn alb_multi_value_event() -> Value {
    json!({
        "requestContext": {"elb": {"targetGroupArn": "arn"}},
        "httpMethod": "GET",
        "path": "/resource/",
        "multiValueQueryStringParameters": {
            "q1": ["v1"],
            "q2": ["v2", "v3"]
        },
        "multiValueHeaders": {
            "x-custom-header1": ["v1"],
            "x-custom-header2": ["v2", "v3"]
        },
        "body": "body",
        "isBase64Encoded": false
    })
}

/// What the handler saw, in a form that's easy to compare.
#[derive(Debug, PartialEq)]
struct Seen {
    method: String,
    target: String,
    body: Vec<u8>,
    headers: BTreeMap<String, Vec<String>>,
    source: &'static str,
}

fn seen(req: &Request) -> Seen {
    let headers: BTreeMap<String, Vec<String>> = req
        .headers()
        .keys()
        .map(|k| {
            let values = req
                .headers()
                .get_all(k)
                .iter()
                .map(|v| v.to_str().unwrap().to_owned())
                .collect::<Vec<_>>();
            (k.as_str().to_owned(), values)
        })
        .collect();

    let source = match req.source() {
        Some(SourceEvent::ApiGatewayProxy(_)) => "apigw",
        Some(SourceEvent::ApiGatewayV2Http(_)) => "apigwv2",
        Some(SourceEvent::AlbTargetGroup(_)) => "alb",
        None => "none",
    };

    Seen {
        method: req.method().to_string(),
        target: req.uri().to_string(),
        body: req.body().to_vec(),
        headers,
        source,
    }
}

fn headers(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect::<Vec<_>>()))
        .collect()
}

/// Invoke a handler that records the request, adds a two-valued header and
/// writes `body`.
fn invoke_recording(event: &Value) -> (Seen, Value) {
    let captured = RefCell::new(None);

    let handler = |req: &Request, w: &mut ResponseWriter| {
        *captured.borrow_mut() = Some(seen(req));
        w.headers_mut()
            .append("x-custom-header", HeaderValue::from_static("v1"));
        w.headers_mut()
            .append("x-custom-header", HeaderValue::from_static("v2"));
        w.write_body(b"body");
    };

    let payload = serde_json::to_vec(event).unwrap();
    let reply = wrap(handler).invoke(&payload).unwrap();
    let seen = captured.into_inner().expect("handler was not invoked");
    (seen, serde_json::from_slice(&reply).unwrap())
}

fn expected_reply() -> Value {
    json!({
        "statusCode": 200,
        "headers": {
            "Content-Type": TEXT_PLAIN,
            "X-Custom-Header": "v1"
        },
        "multiValueHeaders": {
            "Content-Type": [TEXT_PLAIN],
            "X-Custom-Header": ["v1", "v2"]
        },
        "body": "body",
        "isBase64Encoded": false
    })
}

#[test]
fn api_gateway_proxy_events() {
    let (seen, reply) = invoke_recording(&api_gateway_proxy_event());

    assert_eq!(
        seen,
        Seen {
            method: "GET".to_owned(),
            target: "/resource/?q1=v1&q2=v2&q2=v3".to_owned(),
            body: b"body".to_vec(),
            headers: headers(&[
                ("x-custom-header1", &["v1"]),
                ("x-custom-header2", &["v2", "v3"]),
            ]),
            source: "apigw",
        }
    );

    assert_eq!(reply, expected_reply());
}

#[test]
fn api_gateway_v2_http_events() {
    let (seen, reply) = invoke_recording(&api_gateway_v2_http_event());

    assert_eq!(
        seen,
        Seen {
            method: "GET".to_owned(),
            target: "/resource/?q1=v1&q2=v2&q2=v3".to_owned(),
            body: b"body".to_vec(),
            headers: headers(&[("x-custom-header1", &["v1"]), ("x-custom-header2", &["v2"])]),
            source: "apigwv2",
        }
    );

    let mut expected = expected_reply();
    expected["cookies"] = json!([]);
    assert_eq!(reply, expected);
}

#[test]
fn alb_single_value_events() {
    let (seen, reply) = invoke_recording(&alb_single_value_event());

    assert_eq!(
        seen,
        Seen {
            method: "GET".to_owned(),
            target: "/resource/?q1=v1&q2=v2".to_owned(),
            body: b"body".to_vec(),
            headers: headers(&[("x-custom-header1", &["v1"]), ("x-custom-header2", &["v2"])]),
            source: "alb",
        }
    );

    let mut expected = expected_reply();
    expected["statusDescription"] = json!("200 OK");
    assert_eq!(reply, expected);
}

#[test]
fn alb_multi_value_events() {
    let (seen, _) = invoke_recording(&alb_multi_value_event());

    assert_eq!(seen.target, "/resource/?q1=v1&q2=v2&q2=v3");
    assert_eq!(
        seen.headers,
        headers(&[
            ("x-custom-header1", &["v1"]),
            ("x-custom-header2", &["v2", "v3"]),
        ])
    );
}

#[test]
fn echo_over_rest_gateway() {
    let event = json!({
        "httpMethod": "GET",
        "path": "/resource/",
        "queryStringParameters": {"q1": "v1"},
        "headers": {"X-A": "1"},
        "body": "body",
        "requestContext": {"apiId": "id"}
    });

    let handler = |req: &Request, w: &mut ResponseWriter| {
        assert_eq!(req.headers()["x-a"], "1");
        w.headers_mut().insert("x-out", HeaderValue::from_static("2"));
        w.write_body(format!("{} {}", req.method(), req.path()).as_bytes());
    };

    let reply = wrap(handler)
        .invoke(&serde_json::to_vec(&event).unwrap())
        .unwrap();
    let reply: Value = serde_json::from_slice(&reply).unwrap();

    assert_eq!(reply["statusCode"], 200);
    assert_eq!(reply["body"], "GET /resource/");
    assert_eq!(reply["headers"]["X-Out"], "2");
    assert_eq!(reply["headers"]["Content-Type"], TEXT_PLAIN);
    assert_eq!(reply["multiValueHeaders"]["X-Out"], json!(["2"]));
    assert!(reply.get("statusDescription").is_none());
}

#[test]
fn query_order_does_not_depend_on_the_event() {
    let targets: Vec<String> = [
        r#"{"httpMethod":"GET","path":"/","queryStringParameters":{"z":"1","a":"","m":"3"},"requestContext":{"apiId":"id"}}"#,
        r#"{"httpMethod":"GET","path":"/","queryStringParameters":{"m":"3","z":"1","a":""},"requestContext":{"apiId":"id"}}"#,
    ]
    .iter()
    .map(|payload| {
        let reply = wrap(lambda_chop::echo).invoke(payload.as_bytes()).unwrap();
        let reply: Value = serde_json::from_slice(&reply).unwrap();
        reply["body"].as_str().unwrap().to_owned()
    })
    .collect();

    assert_eq!(targets, ["GET /?a=&m=3&z=1", "GET /?a=&m=3&z=1"]);
}

#[test]
fn decoded_paths_reach_the_handler_escaped() {
    let event = json!({
        "httpMethod": "GET",
        "path": "/a b/\u{e9}",
        "requestContext": {"apiId": "id"}
    });

    let reply = wrap(lambda_chop::echo).invoke_event(&event).unwrap();
    assert_eq!(reply["body"], "GET /a%20b/%C3%A9");
}

#[test]
fn echo_over_alb_has_status_description() {
    let reply = wrap(lambda_chop::echo)
        .invoke(&serde_json::to_vec(&alb_single_value_event()).unwrap())
        .unwrap();
    let reply: Value = serde_json::from_slice(&reply).unwrap();

    assert_eq!(reply["statusCode"], 200);
    assert_eq!(reply["statusDescription"], "200 OK");
    assert_eq!(reply["body"], "GET /resource/?q1=v1&q2=v2");
}

#[test]
fn binary_bodies_round_trip() {
    let bytes: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0xFF];

    let mut event = api_gateway_proxy_event();
    event["body"] = json!("iVBORw0KGgr/");
    event["isBase64Encoded"] = json!(true);

    let handler = |req: &Request, w: &mut ResponseWriter| {
        w.write_body(req.body());
    };

    let reply = wrap(handler)
        .invoke(&serde_json::to_vec(&event).unwrap())
        .unwrap();
    let reply: Value = serde_json::from_slice(&reply).unwrap();

    assert_eq!(reply["isBase64Encoded"], true);
    assert_eq!(reply["body"], "iVBORw0KGgr/");
    assert_eq!(reply["headers"]["Content-Type"], "image/png");
    assert_eq!(STANDARD.decode(reply["body"].as_str().unwrap()).unwrap(), bytes);
}

#[test]
fn status_and_content_type_from_handler() {
    let handler = |_: &Request, w: &mut ResponseWriter| {
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        w.write_status(StatusCode::CREATED);
        w.write_status(StatusCode::OK);
        w.write_body(br#"{"ok":true}"#);
    };

    let reply = wrap(handler)
        .invoke_event(&alb_single_value_event())
        .unwrap();

    assert_eq!(reply["statusCode"], 201);
    assert_eq!(reply["statusDescription"], "201 Created");
    assert_eq!(reply["headers"]["Content-Type"], "application/json");
    assert_eq!(reply["body"], r#"{"ok":true}"#);
}

fn kind(err: &Error) -> &'static str {
    match err {
        Error::UnsupportedEventType => "unsupported",
        Error::MalformedPayload(_) => "malformed",
        Error::InvalidRequestTarget { .. } => "target",
        Error::Reply(_) => "reply",
    }
}

#[test]
fn errors_abort_before_the_handler() {
    let cases = [
        ("{}", "unsupported"),
        ("not json", "malformed"),
        (r#"{"requestContext":{"apiId":"id"},"resource":"a}"#, "malformed"),
        (
            r#"{"httpMethod":"GET","path":"/resource###%","requestContext":{"apiId":"id"}}"#,
            "target",
        ),
        (
            r#"{"version":"2.0","requestContext":{"apiId":"id"},"resource":"a}"#,
            "malformed",
        ),
        (
            r#"{"version":"2.0","rawPath":"/resource###%","requestContext":{"apiId":"id","http":{"method":"GET"}}}"#,
            "target",
        ),
        (r#"{"requestContext":{"elb":{}},"resource":"a}"#, "malformed"),
        (
            r#"{"httpMethod":"GET","path":"/resource###%","requestContext":{"elb":{}}}"#,
            "target",
        ),
    ];

    for (payload, expected) in cases {
        let handler = |_: &Request, _: &mut ResponseWriter| {
            panic!("handler should not run");
        };

        let err = wrap(handler).invoke(payload.as_bytes()).unwrap_err();
        assert_eq!(kind(&err), expected, "unexpected error {err:?} for {payload}");
    }
}
