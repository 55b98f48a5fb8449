//! Integration tests for the ragline library.
//! These tests require a running deployment and credentials in the
//! environment: RAGLINE_BASE_URL, RAGLINE_USERNAME, RAGLINE_PASSWORD.

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use ragline::{ChatRequest, Ragline};

    fn credentials() -> Option<(String, String)> {
        let username = std::env::var("RAGLINE_USERNAME").ok()?;
        let password = std::env::var("RAGLINE_PASSWORD").ok()?;
        Some((username, password))
    }

    fn signed_in_client() -> Option<(Ragline, String, String)> {
        if std::env::var("RAGLINE_BASE_URL").is_err() {
            eprintln!("Skipping test: RAGLINE_BASE_URL not set");
            return None;
        }
        let Some((username, password)) = credentials() else {
            eprintln!("Skipping test: RAGLINE_USERNAME/RAGLINE_PASSWORD not set");
            return None;
        };
        let client = Ragline::new(None).expect("Failed to create client");
        Some((client, username, password))
    }

    #[tokio::test]
    async fn test_sign_in_and_me() {
        let Some((client, username, password)) = signed_in_client() else {
            return;
        };

        let token = client.sign_in(&username, &password).await;
        assert!(token.is_ok(), "Sign-in should succeed with valid credentials");

        let user = client.me().await.expect("me() should succeed once signed in");
        assert_eq!(user.username, username);
        assert!(user.active, "Test account should be active");
    }

    #[tokio::test]
    async fn test_models_listing() {
        let Some((client, username, password)) = signed_in_client() else {
            return;
        };
        client.sign_in(&username, &password).await.unwrap();

        let models = client.models().await.expect("models() should succeed");
        assert!(!models.is_empty(), "Deployment should expose at least one model");
    }

    #[tokio::test]
    async fn test_chat_stream() {
        let Some((client, username, password)) = signed_in_client() else {
            return;
        };
        let Ok(collection) = std::env::var("RAGLINE_COLLECTION") else {
            eprintln!("Skipping test: RAGLINE_COLLECTION not set");
            return;
        };
        client.sign_in(&username, &password).await.unwrap();

        let request = ChatRequest::new("What does this collection cover?", collection);
        let deltas = client
            .chat_stream(&request)
            .await
            .expect("Stream request should succeed");
        futures::pin_mut!(deltas);

        let mut answer = String::new();
        while let Some(item) = deltas.next().await {
            let delta = item.expect("Stream should not fail mid-flight");
            if let Some(text) = delta.as_text() {
                answer.push_str(text);
            }
        }
        assert!(!answer.is_empty(), "Expected streamed content");
    }

    #[tokio::test]
    async fn test_chat_with_file() {
        let Some((client, username, password)) = signed_in_client() else {
            return;
        };
        client.sign_in(&username, &password).await.unwrap();

        let document = b"The merging unit publishes sampled values at 4800 Hz.".to_vec();
        let response = client
            .chat_with_file(
                "What rate does the merging unit publish at?",
                "notes.txt",
                document,
                None,
            )
            .await
            .expect("chat_with_file should succeed");
        assert!(!response.response.is_empty(), "Expected a generated answer");
    }

    #[tokio::test]
    async fn test_stream_requires_collection() {
        // Runs without a deployment: the precondition fails client-side.
        let client = Ragline::new(Some("https://rag.invalid/".to_string())).unwrap();
        let request = ChatRequest::new("query", "");
        let err = client.chat_stream(&request).await.err().expect("must fail");
        assert!(err.is_validation());
    }
}
