use anyhow::{anyhow, Result};
use async_trait::async_trait;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::types::Release;
use crate::config::types::HttpConfig;
use crate::release::capabilities::{
    CommentApi, LabelApi, NewTag, ReleaseApi, Repository, TagApi,
};

pub struct GitHubClient {
    client: Octocrab,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct TagObjectRequest<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    tagger: TaggerRequest<'a>,
}

#[derive(Debug, Serialize)]
struct TaggerRequest<'a> {
    name: &'a str,
    email: &'a str,
    date: String,
}

#[derive(Debug, Deserialize)]
struct TagObject {
    sha: String,
    tag: String,
}

#[derive(Debug, Serialize)]
struct RefRequest<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    reference: String,
}

impl GitHubClient {
    /// Requests are sent once: a resent POST could create a second tag or
    /// release.
    pub fn new(token: String, api_url: Option<&str>, http: &HttpConfig) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token);
        builder.add_retry_config(RetryConfig::None);
        if let Some(uri) = api_url {
            builder = builder.base_uri(uri)?;
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            timeout: http.timeout(),
        })
    }

    /// Bounds a single API round trip by the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = octocrab::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(anyhow!(
                "{} timed out after {}s",
                operation,
                self.timeout.as_secs()
            )),
        }
    }
}

impl From<octocrab::models::repos::Release> for Release {
    fn from(release: octocrab::models::repos::Release) -> Self {
        Release {
            name: release.name.unwrap_or_default(),
            html_url: release.html_url.to_string(),
            tag_name: release.tag_name,
        }
    }
}

#[async_trait]
impl ReleaseApi for GitHubClient {
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>> {
        let repo_handler = self.client.repos(&repo.owner, &repo.name);
        let releases = repo_handler.releases();
        let page = self.bounded("list releases", releases.list().send()).await?;

        Ok(page.items.into_iter().map(Release::from).collect())
    }

    async fn create_release(
        &self,
        repo: &Repository,
        tag_name: &str,
        display_name: &str,
    ) -> Result<Release> {
        let repo_handler = self.client.repos(&repo.owner, &repo.name);
        let releases = repo_handler.releases();
        let release = self
            .bounded(
                "create release",
                releases.create(tag_name).name(display_name).send(),
            )
            .await?;

        Ok(release.into())
    }
}

#[async_trait]
impl TagApi for GitHubClient {
    /// Creates the annotated tag object, then the `refs/tags/<name>`
    /// reference that makes it visible as a tag.
    async fn create_tag(&self, repo: &Repository, tag: &NewTag) -> Result<String> {
        let route = format!("/repos/{}/{}/git/tags", repo.owner, repo.name);
        let body = TagObjectRequest {
            tag: &tag.name,
            message: &tag.message,
            object: &tag.sha,
            kind: "commit",
            tagger: TaggerRequest {
                name: &tag.tagger.name,
                email: &tag.tagger.email,
                date: tag.date.to_rfc3339(),
            },
        };
        let object: TagObject = self
            .bounded("create tag object", self.client.post(route, Some(&body)))
            .await?;
        debug!(tag = %object.tag, sha = %object.sha, "created tag object");

        let route = format!("/repos/{}/{}/git/refs", repo.owner, repo.name);
        let body = RefRequest {
            reference: format!("refs/tags/{}", object.tag),
            sha: &object.sha,
        };
        let git_ref: GitRef = self
            .bounded("create tag reference", self.client.post(route, Some(&body)))
            .await?;
        debug!(reference = %git_ref.reference, "created tag reference");

        Ok(object.tag)
    }
}

#[async_trait]
impl LabelApi for GitHubClient {
    async fn add_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()> {
        let labels = [label.to_string()];
        let issues = self.client.issues(&repo.owner, &repo.name);
        self.bounded("add label", issues.add_labels(issue, &labels)).await?;
        Ok(())
    }

    async fn remove_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()> {
        let issues = self.client.issues(&repo.owner, &repo.name);
        self.bounded("remove label", issues.remove_label(issue, label)).await?;
        Ok(())
    }
}

#[async_trait]
impl CommentApi for GitHubClient {
    async fn create_comment(&self, repo: &Repository, issue: u64, body: &str) -> Result<()> {
        let issues = self.client.issues(&repo.owner, &repo.name);
        self.bounded("create comment", issues.create_comment(issue, body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::capabilities::Tagger;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repo() -> Repository {
        Repository {
            owner: "octo".to_string(),
            name: "bot".to_string(),
        }
    }

    fn client(server: &mockito::ServerGuard) -> GitHubClient {
        let url = server.url();
        GitHubClient::new("t0ken".to_string(), Some(url.as_str()), &HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn create_tag_posts_object_then_reference() {
        let mut server = mockito::Server::new_async().await;
        let tag_object = server
            .mock("POST", "/repos/octo/bot/git/tags")
            .match_body(Matcher::PartialJson(json!({
                "tag": "v0.0.2",
                "message": "v0.0.2",
                "object": "5ca1ab1e",
                "type": "commit",
                "tagger": {
                    "name": "Create Release Action",
                    "email": "githubaction@github.com",
                    "date": "2024-05-01T12:00:00+00:00"
                }
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sha":"7a9","tag":"v0.0.2","message":"v0.0.2"}"#)
            .create_async()
            .await;
        let reference = server
            .mock("POST", "/repos/octo/bot/git/refs")
            .match_body(Matcher::Json(json!({
                "ref": "refs/tags/v0.0.2",
                "sha": "7a9"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ref":"refs/tags/v0.0.2","object":{"sha":"7a9","type":"tag"}}"#)
            .create_async()
            .await;

        let tag = NewTag {
            name: "v0.0.2".to_string(),
            message: "v0.0.2".to_string(),
            sha: "5ca1ab1e".to_string(),
            tagger: Tagger {
                name: "Create Release Action".to_string(),
                email: "githubaction@github.com".to_string(),
            },
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let created = client(&server).create_tag(&repo(), &tag).await.unwrap();

        assert_eq!(created, "v0.0.2");
        tag_object.assert_async().await;
        reference.assert_async().await;
    }

    #[tokio::test]
    async fn create_tag_stops_when_object_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/octo/bot/git/tags")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Validation Failed","documentation_url":"https://docs.github.com"}"#)
            .create_async()
            .await;
        let reference = server
            .mock("POST", "/repos/octo/bot/git/refs")
            .expect(0)
            .create_async()
            .await;

        let tag = NewTag {
            name: "v0.0.2".to_string(),
            message: "v0.0.2".to_string(),
            sha: "5ca1ab1e".to_string(),
            tagger: Tagger {
                name: "bot".to_string(),
                email: "bot@example.com".to_string(),
            },
            date: Utc::now(),
        };

        assert!(client(&server).create_tag(&repo(), &tag).await.is_err());
        reference.assert_async().await;
    }

    fn release_json(id: u64, tag: &str) -> serde_json::Value {
        let base = "https://api.github.com/repos/octo/bot";
        json!({
            "url": format!("{base}/releases/{id}"),
            "html_url": format!("https://github.com/octo/bot/releases/tag/{tag}"),
            "assets_url": format!("{base}/releases/{id}/assets"),
            "upload_url": format!("https://uploads.github.com/repos/octo/bot/releases/{id}/assets{{?name,label}}"),
            "tarball_url": format!("{base}/tarball/{tag}"),
            "zipball_url": format!("{base}/zipball/{tag}"),
            "id": id,
            "node_id": format!("RE_{id}"),
            "tag_name": tag,
            "target_commitish": "main",
            "name": format!("Release {tag}"),
            "body": null,
            "draft": false,
            "prerelease": false,
            "created_at": "2024-05-01T12:00:00Z",
            "published_at": "2024-05-01T12:00:00Z",
            "author": {
                "login": "octocat",
                "id": 1,
                "node_id": "MDQ6VXNlcjE=",
                "avatar_url": "https://github.com/images/error/octocat_happy.gif",
                "gravatar_id": "",
                "url": "https://api.github.com/users/octocat",
                "html_url": "https://github.com/octocat",
                "followers_url": "https://api.github.com/users/octocat/followers",
                "following_url": "https://api.github.com/users/octocat/following{/other_user}",
                "gists_url": "https://api.github.com/users/octocat/gists{/gist_id}",
                "starred_url": "https://api.github.com/users/octocat/starred{/owner}{/repo}",
                "subscriptions_url": "https://api.github.com/users/octocat/subscriptions",
                "organizations_url": "https://api.github.com/users/octocat/orgs",
                "repos_url": "https://api.github.com/users/octocat/repos",
                "events_url": "https://api.github.com/users/octocat/events{/privacy}",
                "received_events_url": "https://api.github.com/users/octocat/received_events",
                "type": "User",
                "site_admin": false
            },
            "assets": []
        })
    }

    #[tokio::test]
    async fn list_releases_with_none_published() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octo/bot/releases")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let releases = client(&server).list_releases(&repo()).await.unwrap();
        assert!(releases.is_empty());
    }

    #[tokio::test]
    async fn list_releases_keeps_platform_order() {
        let mut server = mockito::Server::new_async().await;
        let body = json!([release_json(3, "v0.1.2"), release_json(2, "v0.1.1")]);
        server
            .mock("GET", "/repos/octo/bot/releases")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let releases = client(&server).list_releases(&repo()).await.unwrap();

        let tags: Vec<&str> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v0.1.2", "v0.1.1"]);
        assert_eq!(releases[0].name, "Release v0.1.2");
        assert_eq!(
            releases[0].html_url,
            "https://github.com/octo/bot/releases/tag/v0.1.2"
        );
    }

    #[tokio::test]
    async fn create_release_is_sent_once_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let release = server
            .mock("POST", "/repos/octo/bot/releases")
            .with_status(502)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Bad Gateway","documentation_url":"https://docs.github.com"}"#)
            .expect(1)
            .create_async()
            .await;

        let result = client(&server)
            .create_release(&repo(), "v0.0.2", "Release v0.0.2")
            .await;

        assert!(result.is_err());
        release.assert_async().await;
    }

    #[tokio::test]
    async fn tag_object_is_sent_once_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let tag_object = server
            .mock("POST", "/repos/octo/bot/git/tags")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let tag = NewTag {
            name: "v0.0.2".to_string(),
            message: "v0.0.2".to_string(),
            sha: "5ca1ab1e".to_string(),
            tagger: Tagger {
                name: "bot".to_string(),
                email: "bot@example.com".to_string(),
            },
            date: Utc::now(),
        };

        assert!(client(&server).create_tag(&repo(), &tag).await.is_err());
        tag_object.assert_async().await;
    }

    #[tokio::test]
    async fn unresponsive_server_hits_timeout() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let url = format!("http://{}", addr);
        let client = GitHubClient::new(
            "t0ken".to_string(),
            Some(url.as_str()),
            &HttpConfig { timeout_secs: 1 },
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = client.list_releases(&repo()).await.unwrap_err();
        hold.abort();

        assert!(err.to_string().contains("timed out"), "{err:#}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn label_removal_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "DELETE",
                Matcher::Regex(r"^/repos/octo/bot/issues/7/labels/.+$".to_string()),
            )
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Label does not exist","documentation_url":"https://docs.github.com"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .remove_label(&repo(), 7, "createrelease:pending")
            .await;
        assert!(result.is_err());
    }
}
