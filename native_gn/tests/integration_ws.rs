//! WebSocket round-trip against the real router: join events in, lobby
//! snapshots out.

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use gn_shared::{ClientMsg, ServerMsg};
use std::time::Duration;

async fn recv_msg<R>(read: &mut R, want: impl Fn(&ServerMsg) -> bool) -> Option<ServerMsg>
where
    R: StreamExt<
            Item = Result<
                tokio_tungstenite::tungstenite::Message,
                tokio_tungstenite::tungstenite::Error,
            >,
        > + Unpin,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        match tokio::time::timeout(Duration::from_millis(300), read.next()).await {
            Ok(Some(Ok(tokio_tungstenite::tungstenite::Message::Text(txt)))) => {
                if let Ok(sm) = serde_json::from_str::<ServerMsg>(&txt) {
                    if want(&sm) {
                        return Some(sm);
                    }
                }
            }
            Ok(Some(Ok(_))) => continue,
            _ => break,
        }
    }
    None
}

#[tokio::test]
async fn join_events_broadcast_lobby_snapshots() -> Result<()> {
    let state = native_gn::server::AppState::default();
    let app = native_gn::server::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let ws_url = format!("ws://127.0.0.1:{}/ws", addr.port());
    let (ws1, _) = tokio_tungstenite::connect_async(&ws_url).await?;
    let (ws2, _) = tokio_tungstenite::connect_async(&ws_url).await?;
    let (mut write1, mut read1) = ws1.split();
    let (mut write2, mut read2) = ws2.split();

    // both clients greet with a Welcome
    assert!(
        recv_msg(&mut read1, |m| matches!(m, ServerMsg::Welcome))
            .await
            .is_some()
    );
    assert!(
        recv_msg(&mut read2, |m| matches!(m, ServerMsg::Welcome))
            .await
            .is_some()
    );

    let join1 = serde_json::to_string(&ClientMsg::JoinLobby {
        slug: "table-1".into(),
        player_name: "Alice".into(),
    })?;
    write1
        .send(tokio_tungstenite::tungstenite::Message::Text(join1))
        .await?;

    let first = recv_msg(&mut read1, |m| matches!(m, ServerMsg::LobbyUpdated(_))).await;
    match first {
        Some(ServerMsg::LobbyUpdated(snapshot)) => {
            assert_eq!(snapshot.slug, "table-1");
            assert_eq!(snapshot.players.len(), 1);
        }
        other => panic!("expected a lobby snapshot, got {:?}", other),
    }

    let join2 = serde_json::to_string(&ClientMsg::JoinLobby {
        slug: "table-1".into(),
        player_name: "Bob".into(),
    })?;
    write2
        .send(tokio_tungstenite::tungstenite::Message::Text(join2))
        .await?;

    // the earlier member sees the updated roster too
    let seen_by_alice = recv_msg(&mut read1, |m| {
        matches!(m, ServerMsg::LobbyUpdated(s) if s.players.len() == 2)
    })
    .await;
    assert!(seen_by_alice.is_some(), "Alice never saw Bob join");

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn wire_events_use_kebab_case_names() -> Result<()> {
    let json = serde_json::to_string(&ClientMsg::JoinLobby {
        slug: "s".into(),
        player_name: "n".into(),
    })?;
    assert!(json.contains("\"join-lobby\""));

    let parsed: ClientMsg = serde_json::from_str(
        r#"{"type":"select-card","data":{"slug":"s","card":"sprint#001","will_burn":false}}"#,
    )?;
    match parsed {
        ClientMsg::SelectCard {
            slug,
            card,
            will_burn,
            tokens_used,
        } => {
            assert_eq!(slug, "s");
            assert_eq!(card, "sprint#001");
            assert!(!will_burn);
            assert!(tokens_used.is_empty());
        }
        other => panic!("wrong variant: {:?}", other),
    }
    Ok(())
}
