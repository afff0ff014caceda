use async_trait::async_trait;
use bucketlist_core::{
    AccessOutcome, AccessProbe, Coordinate, EditIdentity, GateState, MapSession, SessionError,
    StorageConfig, UpdateOutcome,
};

struct FixedProbe(AccessOutcome);

#[async_trait]
impl AccessProbe for FixedProbe {
    async fn evaluate(&self, _reason: &str) -> AccessOutcome {
        self.0.clone()
    }
}

fn open(dir: &tempfile::TempDir) -> MapSession {
    MapSession::open(&StorageConfig::new(dir.path()).unwrap()).unwrap()
}

#[tokio::test]
async fn places_stay_hidden_until_probe_grants_access() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open(&dir);

    let outcome = session
        .authenticate(&FixedProbe(AccessOutcome::Unsupported))
        .await;
    assert_eq!(outcome, AccessOutcome::Unsupported);
    assert_eq!(session.gate_state(), &GateState::Locked);
    assert!(matches!(session.places(), Err(SessionError::Locked)));

    session
        .authenticate(&FixedProbe(AccessOutcome::Denied {
            reason: "cancelled".to_string(),
        }))
        .await;
    assert!(matches!(session.gate_state(), GateState::Failed { .. }));
    assert!(matches!(session.places(), Err(SessionError::Locked)));

    session.authenticate(&FixedProbe(AccessOutcome::Granted)).await;
    assert!(session.places().unwrap().is_empty());
}

#[tokio::test]
async fn session_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let place_id = {
        let mut session = open(&dir);
        session.authenticate(&FixedProbe(AccessOutcome::Granted)).await;
        let place = session.add_place(Coordinate::new(56.0, -3.0)).unwrap();
        session.select_place(place.id).unwrap();
        let mut edit = session.begin_edit().unwrap();
        edit.set_name("Edinburgh");
        edit.set_description("festival in August");
        assert_eq!(
            session.commit_edit(&edit, EditIdentity::Preserve).unwrap(),
            UpdateOutcome::Replaced { index: 0 }
        );
        session.set_hybrid_mode(true);
        place.id
    };

    let mut reopened = open(&dir);
    assert!(reopened.is_hybrid_mode());
    assert_eq!(reopened.gate_state(), &GateState::Locked);

    reopened
        .authenticate(&FixedProbe(AccessOutcome::Granted))
        .await;
    let places = reopened.places().unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].id, place_id);
    assert_eq!(places[0].name, "Edinburgh");
    assert_eq!(places[0].description, "festival in August");
}

#[tokio::test]
async fn lock_clears_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = open(&dir);
    session.authenticate(&FixedProbe(AccessOutcome::Granted)).await;
    let place = session.add_place(Coordinate::new(1.0, 1.0)).unwrap();
    session.select_place(place.id).unwrap();

    session.lock();
    session.apply_access_outcome(&AccessOutcome::Granted);
    assert_eq!(session.selected_place().unwrap(), None);
    assert!(matches!(
        session.select_place(uuid::Uuid::new_v4()),
        Err(SessionError::UnknownPlace(_))
    ));
}
