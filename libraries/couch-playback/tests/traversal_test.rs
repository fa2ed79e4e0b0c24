//! Playlist traversal scenarios and properties

mod common;

use common::{item, rail, two_rails};
use couch_core::{ItemId, PlaylistRail};
use couch_playback::{Playlist, PlaylistState};
use proptest::prelude::*;
use std::collections::HashSet;

// ===== Scenarios =====

#[test]
fn next_crosses_into_following_rail() {
    let playlist = Playlist::with_rails(two_rails()).unwrap();
    assert_eq!(playlist.next_item(&"2".into()).unwrap().id.as_str(), "3");
    assert!(playlist.next_item(&"4".into()).is_none());
}

#[test]
fn next_wraps_to_first_rail_when_looping() {
    let playlist = Playlist::with_rails(two_rails()).unwrap().with_loop(true);
    assert_eq!(playlist.next_item(&"4".into()).unwrap().id.as_str(), "1");
}

#[test]
fn previous_wraps_to_last_rail_when_looping() {
    let playlist = Playlist::with_rails(two_rails()).unwrap().with_loop(true);
    assert_eq!(playlist.previous_item(&"1".into()).unwrap().id.as_str(), "4");
    assert_eq!(playlist.previous_item(&"3".into()).unwrap().id.as_str(), "2");
}

#[test]
fn override_receives_state_and_current_id() {
    let mut playlist = Playlist::with_rails(two_rails()).unwrap();
    playlist.set_previous_override(Some(Box::new(|state: &PlaylistState, current: &ItemId| {
        assert_eq!(current.as_str(), "3");
        state.rails.last().and_then(|rail| rail.items.last()).cloned()
    })));
    assert_eq!(playlist.previous_item(&"3".into()).unwrap().id.as_str(), "4");
}

#[test]
fn subscribers_see_current_item_changes_only() {
    use couch_playback::Selector;
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut playlist = Playlist::with_rails(two_rails()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    playlist.subscribe(
        Selector::new(|state: &PlaylistState| state.current_item_id.clone()),
        move |current: &Option<ItemId>| sink.borrow_mut().push(current.clone()),
    );

    playlist.toggle_rail_expansion(&"A".into()).unwrap();
    playlist.set_visible(true);
    playlist.set_current_item(Some(&"3".into()));
    playlist.set_current_item(Some(&"3".into()));
    playlist.add_item(&"B".into(), item("5"), None).unwrap();

    assert_eq!(*seen.borrow(), vec![Some(ItemId::new("3"))]);
}

// ===== Properties =====

/// Rails with unique item ids and arbitrary priorities, some possibly empty
fn arbitrary_rails() -> impl Strategy<Value = Vec<PlaylistRail>> {
    prop::collection::vec((-5i32..5, 0usize..4), 1..6).prop_map(|shapes| {
        let mut next_id = 0;
        shapes
            .into_iter()
            .enumerate()
            .map(|(index, (priority, len))| {
                let ids: Vec<String> = (0..len)
                    .map(|_| {
                        next_id += 1;
                        format!("item-{next_id}")
                    })
                    .collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                rail(&format!("rail-{index}"), priority, &refs)
            })
            .collect()
    })
}

fn expected_order(playlist: &Playlist) -> Vec<ItemId> {
    playlist
        .state()
        .items()
        .map(|item| item.id.clone())
        .collect()
}

proptest! {
    /// Property: without loop, walking next from the first item visits every
    /// item once in rail-priority order and then stops
    #[test]
    fn next_visits_every_item_once(rails in arbitrary_rails()) {
        let playlist = Playlist::with_rails(rails).unwrap();
        let order = expected_order(&playlist);
        prop_assume!(!order.is_empty());

        let mut visited = vec![order[0].clone()];
        let mut current = order[0].clone();
        while let Some(next) = playlist.next_item(&current) {
            prop_assert!(visited.len() <= order.len(), "traversal did not terminate");
            visited.push(next.id.clone());
            current = next.id;
        }
        prop_assert_eq!(visited, order);
    }

    /// Property: previous walks the same order backwards
    #[test]
    fn previous_mirrors_next(rails in arbitrary_rails()) {
        let playlist = Playlist::with_rails(rails).unwrap();
        let mut order = expected_order(&playlist);
        prop_assume!(!order.is_empty());
        order.reverse();

        let mut visited = vec![order[0].clone()];
        let mut current = order[0].clone();
        while let Some(previous) = playlist.previous_item(&current) {
            prop_assert!(visited.len() <= order.len(), "traversal did not terminate");
            visited.push(previous.id.clone());
            current = previous.id;
        }
        prop_assert_eq!(visited, order);
    }

    /// Property: with loop, next cycles with period equal to the item count
    #[test]
    fn loop_period_is_item_count(rails in arbitrary_rails(), start in 0usize..20) {
        let playlist = Playlist::with_rails(rails).unwrap().with_loop(true);
        let order = expected_order(&playlist);
        prop_assume!(!order.is_empty());

        let first = order[start % order.len()].clone();
        let mut current = first.clone();
        let mut seen = HashSet::new();
        for _ in 0..order.len() {
            prop_assert!(seen.insert(current.clone()), "item repeated before a full cycle");
            current = playlist.next_item(&current).unwrap().id;
        }
        prop_assert_eq!(current, first);
    }

    /// Property: setting the current item leaves exactly that item active
    #[test]
    fn exactly_one_active_item(rails in arbitrary_rails(), pick in 0usize..30, missing in any::<bool>()) {
        let mut playlist = Playlist::with_rails(rails).unwrap();
        let order = expected_order(&playlist);

        let target = if missing || order.is_empty() {
            ItemId::new("not-in-playlist")
        } else {
            order[pick % order.len()].clone()
        };
        playlist.set_current_item(Some(&target));

        let state = playlist.state();
        let active: Vec<&ItemId> = state.active_items().map(|item| &item.id).collect();
        if order.contains(&target) {
            prop_assert_eq!(active, vec![&target]);
        } else {
            prop_assert!(active.is_empty());
        }
    }

    /// Property: toggling expansion never changes items
    #[test]
    fn expansion_is_cosmetic(rails in arbitrary_rails(), toggles in prop::collection::vec(0usize..6, 0..10)) {
        let mut playlist = Playlist::with_rails(rails).unwrap();
        let before = playlist.rails().to_vec();
        let ids: Vec<_> = before.iter().map(|rail| rail.id.clone()).collect();

        for index in toggles {
            playlist.toggle_rail_expansion(&ids[index % ids.len()]).unwrap();
        }
        prop_assert_eq!(playlist.rails(), before.as_slice());
    }
}
