// GitHub "contents" API 作为文档存储：blob sha 即版本标识
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::store::{RemoteDocument, RemoteDocumentStore, StoreError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    download_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: UpdatedContent,
}

#[derive(Debug, Deserialize)]
struct UpdatedContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

pub struct GitHubContentsStore {
    client: Client,
    api_url: String,
    repository: String, // "owner/name"
    branch: Option<String>,
    token: String,
}

impl GitHubContentsStore {
    pub fn new(
        api_url: &str,
        repository: &str,
        branch: Option<String>,
        token: String,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            branch,
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repository,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token).header(ACCEPT, GITHUB_JSON)
    }

    /// 超过1MB的文件不会内联返回内容，需要通过download_url下载
    fn download(&self, path: &str, url: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| fetch_error(path, e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(path, format!("download returned HTTP {}", response.status())));
        }
        response.text().map_err(|e| fetch_error(path, e.to_string()))
    }
}

impl RemoteDocumentStore for GitHubContentsStore {
    fn describe(&self) -> String {
        match &self.branch {
            Some(branch) => format!("github:{}@{}", self.repository, branch),
            None => format!("github:{}", self.repository),
        }
    }

    fn fetch(&self, path: &str) -> Result<RemoteDocument, StoreError> {
        let mut request = self.authorized(self.client.get(self.contents_url(path)));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }
        let response = request.send().map_err(|e| fetch_error(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_fetch_failure(&self.describe(), path, status, &error_message(response)));
        }

        let body: ContentsResponse = response
            .json()
            .map_err(|e| fetch_error(path, format!("unexpected response body: {}", e)))?;
        debug!(path, sha = %body.sha, encoding = %body.encoding, "fetched contents");

        let content = if body.encoding == "base64" {
            decode_content(&body.content).map_err(|reason| fetch_error(path, reason))?
        } else if let Some(url) = &body.download_url {
            self.download(path, url)?
        } else {
            return Err(fetch_error(path, format!("unsupported content encoding '{}'", body.encoding)));
        };

        Ok(RemoteDocument {
            content,
            version: body.sha,
        })
    }

    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_version: &str,
    ) -> Result<String, StoreError> {
        let payload = UpdateRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            sha: expected_version,
            branch: self.branch.as_deref(),
        };
        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .json(&payload)
            .send()
            .map_err(|e| write_error(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_update_failure(path, expected_version, status, &error_message(response)));
        }

        let body: UpdateResponse = response
            .json()
            .map_err(|e| write_error(path, format!("unexpected response body: {}", e)))?;
        Ok(body.content.sha)
    }
}

fn fetch_error(path: &str, reason: String) -> StoreError {
    StoreError::Fetch {
        path: path.to_string(),
        reason,
    }
}

fn write_error(path: &str, reason: String) -> StoreError {
    StoreError::Write {
        path: path.to_string(),
        reason,
    }
}

/// 读取GitHub错误响应中的message字段
fn error_message(response: Response) -> String {
    let text = response.text().unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text)
}

fn classify_fetch_failure(store: &str, path: &str, status: StatusCode, message: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            store: store.to_string(),
            path: path.to_string(),
        },
        _ => fetch_error(path, format!("HTTP {}: {}", status, message)),
    }
}

fn classify_update_failure(path: &str, expected: &str, status: StatusCode, message: &str) -> StoreError {
    match status {
        StatusCode::CONFLICT => conflict(path, expected),
        // 422也用于其他校验失败，只有sha不匹配时才是版本冲突
        StatusCode::UNPROCESSABLE_ENTITY if is_sha_mismatch(message) => conflict(path, expected),
        _ => write_error(path, format!("HTTP {}: {}", status, message)),
    }
}

fn is_sha_mismatch(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("sha") && message.contains("match")
}

fn conflict(path: &str, expected: &str) -> StoreError {
    StoreError::Conflict {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}

/// GitHub返回的base64内容按60列换行，解码前去掉空白
fn decode_content(encoded: &str) -> Result<String, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| format!("invalid base64 content: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("content is not UTF-8: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_store(branch: Option<&str>) -> GitHubContentsStore {
        GitHubContentsStore::new(
            "https://api.github.com/",
            "someone/grading-data",
            branch.map(|b| b.to_string()),
            "token".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_contents_url() {
        let store = create_store(None);
        assert_eq!(
            store.contents_url("/GT_Pneumothorax.csv"),
            "https://api.github.com/repos/someone/grading-data/contents/GT_Pneumothorax.csv"
        );
        assert_eq!(store.describe(), "github:someone/grading-data");
        assert_eq!(create_store(Some("main")).describe(), "github:someone/grading-data@main");
    }

    #[test]
    fn test_decode_wrapped_content() {
        let encoded = STANDARD.encode("Index,Image_Name,Label_Flag\n0,a.png,0\n");
        let (head, tail) = encoded.split_at(20);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(
            decode_content(&wrapped).unwrap(),
            "Index,Image_Name,Label_Flag\n0,a.png,0\n"
        );
        assert!(decode_content("***").is_err());
    }

    #[test]
    fn test_contents_response_parsing() {
        let json = r#"{"name":"GT.csv","path":"GT.csv","sha":"abc123","size":10,
            "content":"SW5kZXgK\n","encoding":"base64","download_url":"https://raw.example/GT.csv"}"#;
        let body: ContentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.sha, "abc123");
        assert_eq!(body.encoding, "base64");
        assert_eq!(decode_content(&body.content).unwrap(), "Index\n");

        // 大文件：无内联内容
        let json = r#"{"sha":"def456","content":"","encoding":"none","download_url":"https://raw.example/GT.csv"}"#;
        let body: ContentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.encoding, "none");
        assert!(body.download_url.is_some());
    }

    #[test]
    fn test_update_request_serialization() {
        let payload = UpdateRequest {
            message: "grade",
            content: STANDARD.encode("x"),
            sha: "abc",
            branch: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sha"], "abc");
        assert_eq!(value["content"], "eA==");
        assert!(value.get("branch").is_none());

        let payload = UpdateRequest { branch: Some("main"), ..payload };
        assert_eq!(serde_json::to_value(&payload).unwrap()["branch"], "main");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_fetch_failure("github:x/y", "GT.csv", StatusCode::NOT_FOUND, "Not Found"),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            classify_fetch_failure("github:x/y", "GT.csv", StatusCode::UNAUTHORIZED, "Bad credentials"),
            StoreError::Fetch { .. }
        ));
        assert!(matches!(
            classify_update_failure("GT.csv", "abc", StatusCode::CONFLICT, "does not match"),
            StoreError::Conflict { .. }
        ));
        assert!(matches!(
            classify_update_failure(
                "GT.csv",
                "abc",
                StatusCode::UNPROCESSABLE_ENTITY,
                "sha does not match"
            ),
            StoreError::Conflict { .. }
        ));
        assert!(matches!(
            classify_update_failure(
                "GT.csv",
                "abc",
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied."
            ),
            StoreError::Write { .. }
        ));
        assert!(matches!(
            classify_update_failure("GT.csv", "abc", StatusCode::UNPROCESSABLE_ENTITY, "path cannot start with a slash"),
            StoreError::Write { .. }
        ));
        assert!(matches!(
            classify_update_failure("GT.csv", "abc", StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            StoreError::Write { .. }
        ));
    }
}
