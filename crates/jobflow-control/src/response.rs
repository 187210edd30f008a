//! Response body parsing.
//!
//! The JSON protocol answers with JSON objects and the legacy protocol with
//! XML. Only a handful of fields are ever read, so XML is scanned for
//! elements by name rather than parsed.

use serde::Deserialize;
use serde_json::Value;

use crate::types::ClusterStatus;

/// Raw content of the first `<tag>...</tag>` element in `body`.
///
/// The opening tag may carry attributes. Entities are left as they are.
fn xml_element<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut from = 0;
    loop {
        let at = from + body[from..].find(&open)?;
        let rest = &body[at + open.len()..];
        match rest.chars().next() {
            Some('>') => {
                let start = at + open.len() + 1;
                let len = body[start..].find(&close)?;
                return Some(body[start..start + len].trim());
            }
            Some(c) if c.is_whitespace() => {
                let gt = rest.find('>')?;
                if rest[..gt].ends_with('/') {
                    return Some("");
                }
                let start = at + open.len() + gt + 1;
                let len = body[start..].find(&close)?;
                return Some(body[start..start + len].trim());
            }
            _ => from = at + open.len(),
        }
    }
}

/// Text of the first `<tag>` element with XML entities decoded.
fn xml_text(body: &str, tag: &str) -> Option<String> {
    xml_element(body, tag).map(decode_entities)
}

/// Decode the predefined XML entities and numeric character references.
/// Unknown or malformed references are kept verbatim.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let decoded = match &rest[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                entity => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map_or_else(
                        || entity.strip_prefix('#').and_then(|d| d.parse().ok()),
                        |hex| u32::from_str_radix(hex, 16).ok(),
                    )
                    .and_then(char::from_u32),
            };
            decoded.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Extract the human-readable message from an error body.
///
/// Understands `<ErrorResponse><Error><Message>` XML documents and JSON
/// objects carrying `message` or `Message`. Anything else is returned as is.
#[must_use]
pub fn parse_error_response(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(message) = ["message", "Message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
        {
            return message.to_string();
        }
    }

    xml_text(body, "Message").unwrap_or_else(|| body.to_string())
}

/// The cluster id in a `RunJobFlow` response, in either protocol.
#[must_use]
pub fn parse_job_flow_id(body: &str) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return map
            .get("JobFlowId")
            .and_then(Value::as_str)
            .map(ToString::to_string);
    }
    xml_text(body, "JobFlowId")
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeClusterResponse {
    cluster: ClusterDescription,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterDescription {
    id: String,
    name: String,
    status: StatusDescription,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatusDescription {
    state: String,
    #[serde(default)]
    state_change_reason: Option<StateChangeReason>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateChangeReason {
    #[serde(default)]
    message: Option<String>,
}

/// The cluster status in a `DescribeCluster` response, in either protocol.
#[must_use]
pub fn parse_cluster_status(body: &str) -> Option<ClusterStatus> {
    if let Ok(response) = serde_json::from_str::<DescribeClusterResponse>(body) {
        let cluster = response.cluster;
        return Some(ClusterStatus {
            id: cluster.id,
            name: cluster.name,
            state: cluster.status.state,
            state_change_reason: cluster
                .status
                .state_change_reason
                .and_then(|reason| reason.message),
        });
    }

    let cluster = xml_element(body, "Cluster")?;
    Some(ClusterStatus {
        id: xml_text(cluster, "Id")?,
        name: xml_text(cluster, "Name")?,
        state: xml_text(cluster, "State")?,
        state_change_reason: xml_text(cluster, "Message"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_from_xml() {
        let body = "<ErrorResponse><Error><Type>Sender</Type>\
                    <Code>ValidationError</Code>\
                    <Message>Instance count must be greater than 0</Message>\
                    </Error><RequestId>1</RequestId></ErrorResponse>";
        assert_eq!(
            parse_error_response(body),
            "Instance count must be greater than 0"
        );
    }

    #[test]
    fn xml_entities_are_decoded() {
        let body = "<ErrorResponse><Error>\
                    <Message>Tag &lt;env&gt; &amp; &quot;owner&quot; can&apos;t be empty&#33;</Message>\
                    </Error></ErrorResponse>";
        assert_eq!(
            parse_error_response(body),
            r#"Tag <env> & "owner" can't be empty!"#
        );
    }

    #[test]
    fn stray_ampersands_are_kept() {
        assert_eq!(decode_entities("a & b &unknown; &amp;lt;"), "a & b &unknown; &lt;");
        assert_eq!(decode_entities("&#x41;&#66;&#xZZ;"), "AB&#xZZ;");
    }

    #[test]
    fn opening_tags_may_carry_attributes() {
        let body = r#"<Response xmlns="http://elasticmapreduce.amazonaws.com/doc/2009-03-31">
                      <Message xml:lang="en">Access denied</Message></Response>"#;
        assert_eq!(parse_error_response(body), "Access denied");
        assert_eq!(xml_element("<MessageId>1</MessageId>", "Message"), None);
        assert_eq!(xml_element("<Message /><Message>x</Message>", "Message"), Some(""));
    }

    #[test]
    fn error_message_from_json() {
        assert_eq!(
            parse_error_response(r#"{"__type":"ValidationException","message":"bad step"}"#),
            "bad step"
        );
        assert_eq!(
            parse_error_response(r#"{"Message":"denied"}"#),
            "denied"
        );
    }

    #[test]
    fn unrecognised_error_body_is_kept() {
        assert_eq!(parse_error_response("Service Unavailable"), "Service Unavailable");
        assert_eq!(parse_error_response(r#"{"code":1}"#), r#"{"code":1}"#);
    }

    #[test]
    fn job_flow_id_from_either_protocol() {
        assert_eq!(
            parse_job_flow_id(r#"{"JobFlowId":"j-ABC123"}"#).as_deref(),
            Some("j-ABC123")
        );
        assert_eq!(
            parse_job_flow_id(
                "<RunJobFlowResponse><RunJobFlowResult>\
                 <JobFlowId>j-XYZ789</JobFlowId>\
                 </RunJobFlowResult></RunJobFlowResponse>"
            )
            .as_deref(),
            Some("j-XYZ789")
        );
        assert_eq!(parse_job_flow_id("{}"), None);
    }

    #[test]
    fn cluster_status_from_json() {
        let body = r#"{"Cluster":{"Id":"j-1","Name":"Nightly","Status":{
            "State":"TERMINATED",
            "StateChangeReason":{"Code":"ALL_STEPS_COMPLETED","Message":"Steps completed"}}}}"#;
        assert_eq!(
            parse_cluster_status(body),
            Some(ClusterStatus {
                id: "j-1".into(),
                name: "Nightly".into(),
                state: "TERMINATED".into(),
                state_change_reason: Some("Steps completed".into()),
            })
        );
    }

    #[test]
    fn cluster_status_from_xml() {
        let body = "<DescribeClusterResponse><DescribeClusterResult><Cluster>\
                    <Id>j-2</Id><Name>Legacy</Name>\
                    <Status><State>WAITING</State></Status>\
                    </Cluster></DescribeClusterResult></DescribeClusterResponse>";
        let status = parse_cluster_status(body).unwrap();
        assert_eq!(status.id, "j-2");
        assert_eq!(status.state, "WAITING");
        assert_eq!(status.state_change_reason, None);
    }

    #[test]
    fn cluster_status_requires_core_fields() {
        assert_eq!(parse_cluster_status(r#"{"Cluster":{"Id":"j-1"}}"#), None);
        assert_eq!(parse_cluster_status("<Cluster><Id>j-1</Id></Cluster>"), None);
    }
}
