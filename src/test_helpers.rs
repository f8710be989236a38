use crate::db::{Database, Open};
use crate::{crypto, page, serve, AppState};
use axum_extra::extract::cookie::Key;
use reqwest::redirect::Policy;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub(crate) struct Client {
    client: reqwest::Client,
    addr: std::net::SocketAddr,
}

impl Client {
    /// Start an in-memory instance seeded with the accounts `alice`, `bob`
    /// and `admin`, all using the password `secret`.
    pub(crate) async fn new() -> Self {
        let db = Database::new(Open::Memory).expect("creating database");

        for (name, admin) in [("alice", false), ("bob", false), ("admin", true)] {
            let hash = crypto::hash("secret".to_string())
                .await
                .expect("hashing password");

            db.insert_user(name.to_string(), hash, admin)
                .await
                .expect("inserting user");
        }

        let key = Key::generate();
        let base_url = Url::parse("http://localhost:8080").expect("parsing url");
        let page = Arc::new(page::Page::new("test".to_string(), base_url));
        let state = AppState { db, key, page };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("binding to listener");
        let addr = listener.local_addr().expect("listener address");

        tokio::spawn(async move {
            serve(listener, state, Duration::new(30, 0), 1024 * 1024)
                .await
                .expect("serving");
        });

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .build()
            .expect("building client");

        Self { client, addr }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("http://{}{path}", self.addr))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("http://{}{path}", self.addr))
    }

    pub(crate) async fn login(&self, name: &str) -> Result<(), Box<dyn std::error::Error>> {
        let res = self
            .post("/login")
            .form(&[("username", name), ("password", "secret")])
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        Ok(())
    }

    pub(crate) async fn logout(&self) -> Result<(), Box<dyn std::error::Error>> {
        let res = self.get("/logout").send().await?;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        Ok(())
    }

    /// Create a trick with a one line description and the given video URLs.
    pub(crate) async fn create_trick(
        &self,
        name: &str,
        videos: &[&str],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let res = self
            .post("/tricks/new")
            .form(&[
                ("name", name),
                ("description", "A trick."),
                ("cover", ""),
                ("pictures", ""),
                ("videos", &videos.join("\n")),
            ])
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        Ok(())
    }
}
