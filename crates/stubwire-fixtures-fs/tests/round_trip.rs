// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture sets saved to disk and turned back into transports.
#![allow(clippy::unwrap_used)]

use std::time::Duration;
use stubwire_core::{FixtureService, FixtureSet};
use stubwire_dry_tests::{user_info_request, user_payload, Recorder, SubscriptionBuilder};
use stubwire_fixtures_fs::FsFixtureStore;

fn user_set() -> FixtureSet {
    FixtureSet {
        subscriptions: vec![SubscriptionBuilder::new(user_info_request("Changping Chen"))
            .declared_id(3)
            .user_result("Dhaivat Pandya", 50)
            .user_result("Vyacheslav Kim", 50)
            .build()],
        ..FixtureSet::default()
    }
}

#[test]
fn set_survives_a_trip_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let service = FixtureService::new(FsFixtureStore::new(dir.path()).unwrap());
    service.save("users/basic", &user_set()).unwrap();

    assert!(dir.path().join("users").join("basic.json").is_file());
    assert_eq!(service.load("users/basic").unwrap(), Some(user_set()));
    assert!(service.load("users/missing").unwrap().is_none());
}

#[test]
fn transport_built_from_disk_delivers_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let service = FixtureService::new(FsFixtureStore::new(dir.path()).unwrap());
    service.save("users", &user_set()).unwrap();

    let mut transport = service.transport("users").unwrap();
    let rec = Recorder::new();
    let id = transport
        .subscribe(&user_info_request("Changping Chen"), rec.handler())
        .unwrap();
    transport.fire_result(id).unwrap();
    transport.fire_result(id).unwrap();
    transport.advance(Duration::from_millis(50));

    assert_eq!(
        rec.payloads(),
        vec![user_payload("Dhaivat Pandya"), user_payload("Vyacheslav Kim")]
    );
}
