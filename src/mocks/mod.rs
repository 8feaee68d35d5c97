//! Mock implementations for testing.

mod transport;

pub use transport::{transient_error, MockOutcome, MockResponse, MockTransport};

use crate::codec::message_body_md5;

/// Canned MNS documents for tests.
pub struct TestFixtures;

impl TestFixtures {
    /// An MNS error document.
    pub fn error_document(code: &str, message: &str, request_id: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Error xmlns=\"http://mns.aliyuncs.com/doc/v1\">\
             <Code>{}</Code><Message>{}</Message><RequestId>{}</RequestId>\
             <HostId>http://123456.mns.cn-hangzhou.aliyuncs.com</HostId></Error>",
            code, message, request_id
        )
    }

    /// A send/publish response acknowledging `body`.
    pub fn send_message_response(message_id: &str, body: &[u8]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Message xmlns=\"http://mns.aliyuncs.com/doc/v1/\">\
             <MessageId>{}</MessageId><MessageBodyMD5>{}</MessageBodyMD5></Message>",
            message_id,
            message_body_md5(body)
        )
    }

    /// A received message element carrying `body` as stored by the service.
    pub fn message_element(message_id: &str, receipt_handle: &str, body: &str) -> String {
        format!(
            "<Message>\
             <MessageId>{}</MessageId>\
             <ReceiptHandle>{}</ReceiptHandle>\
             <MessageBodyMD5>{}</MessageBodyMD5>\
             <MessageBody>{}</MessageBody>\
             <EnqueueTime>1250700979248</EnqueueTime>\
             <NextVisibleTime>1250700799348</NextVisibleTime>\
             <FirstDequeueTime>1250700779318</FirstDequeueTime>\
             <DequeueCount>1</DequeueCount>\
             <Priority>8</Priority>\
             </Message>",
            message_id,
            receipt_handle,
            message_body_md5(body.as_bytes()),
            body
        )
    }
}
