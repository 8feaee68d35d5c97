//! Tests for classification of service errors and transport faults.

use aliyun_mns::error::{classify, decode_error_response, ErrorCategory};
use aliyun_mns::mocks::TestFixtures;
use aliyun_mns::{RetryPolicy, TransientFaultKind};
use test_case::test_case;

#[test_case(404, "QueueNotExist" => Some(ErrorCategory::QueueNotExist); "queue not exist")]
#[test_case(404, "TopicNotExist" => Some(ErrorCategory::TopicNotExist); "topic not exist")]
#[test_case(404, "MessageNotExist" => Some(ErrorCategory::MessageNotExist); "message not exist")]
#[test_case(400, "ReceiptHandleError" => Some(ErrorCategory::ReceiptHandleError); "receipt handle error")]
#[test_case(400, "QueueNotExist" => None; "status must match")]
#[test_case(404, "ReceiptHandleError" => None; "code must match status")]
#[test_case(404, "queuenotexist" => None; "code is case sensitive")]
#[test_case(500, "InternalError" => None; "unknown code")]
fn test_classify(status: u16, code: &str) -> Option<ErrorCategory> {
    classify(status, code)
}

#[test_case(404, "QueueNotExist" => (true, false, false, false); "queue")]
#[test_case(404, "TopicNotExist" => (false, true, false, false); "topic")]
#[test_case(404, "MessageNotExist" => (false, false, true, false); "message")]
#[test_case(400, "ReceiptHandleError" => (false, false, false, true); "receipt handle")]
fn test_decoded_predicates(status: u16, code: &str) -> (bool, bool, bool, bool) {
    let body = TestFixtures::error_document(code, "message", "REQ");
    let err = decode_error_response(None, status, body.as_bytes());
    (
        err.is_queue_not_exist(),
        err.is_topic_not_exist(),
        err.is_message_not_exist(),
        err.is_receipt_handle_error(),
    )
}

#[test_case(TransientFaultKind::ConnectionReset => true; "connection reset")]
#[test_case(TransientFaultKind::UnexpectedEof => true; "unexpected eof")]
#[test_case(TransientFaultKind::BrokenPipe => false; "broken pipe")]
#[test_case(TransientFaultKind::ConnectionAborted => false; "connection aborted")]
fn test_default_retry_classification(kind: TransientFaultKind) -> bool {
    RetryPolicy::default().should_retry(&aliyun_mns::mocks::transient_error(kind))
}

#[test]
fn test_predicates_on_foreign_errors() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let dyn_err: &(dyn std::error::Error + 'static) = &io_err;
    assert!(!aliyun_mns::error::is_queue_not_exist(Some(dyn_err)));
    assert!(!aliyun_mns::error::is_queue_not_exist(None));
}

#[test]
fn test_header_request_id_fallback() {
    let body = b"<Error><Code>QueueNotExist</Code><Message>gone</Message></Error>";
    let err = decode_error_response(Some("REQ-HEADER"), 404, body);
    assert_eq!(err.request_id(), Some("REQ-HEADER"));
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.service_code(), Some("QueueNotExist"));
}
