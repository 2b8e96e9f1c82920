mod tools;

#[cfg(test)]
mod controller_tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use shift_board::application::controller::{LoadState, ShiftBoard, ShiftSnapshot};
    use shift_board::application::error::BoardError;
    use shift_board::domain::clock::ManualClock;
    use shift_board::domain::{
        LifecycleError, NewShift, ReorderTarget, Shift, ShiftId, ShiftStatus,
    };
    use shift_board::infrastructure::{
        FallbackShiftStore, JsonFileShiftStore, ShiftStore, SqliteShiftStore,
    };

    use crate::tools::fixtures::{at, loaded_board, new_shift};
    use crate::tools::flaky_store::FlakyStore;

    #[tokio::test]
    async fn test_create_persists_and_appends() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;

        let shift = board.create_shift(new_shift("opening", 9, 11)).await.unwrap();

        assert_eq!(shift.status, ShiftStatus::Scheduled);
        assert_eq!(shift.duration, 2.0);
        assert_eq!(board.shifts(), &[shift.clone()]);
        assert_eq!(store.get_by_id(&shift.id).await.unwrap(), Some(shift));
    }

    #[tokio::test]
    async fn test_create_with_inverted_range_shows_banner() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;

        let r = board.create_shift(new_shift("broken", 11, 9)).await;

        assert!(matches!(r, Err(BoardError::Lifecycle(LifecycleError::InvalidTimeRange { .. }))));
        assert!(board.error_banner().is_some());
        assert!(board.shifts().is_empty());
        assert!(store.get_all().await.unwrap().is_empty());

        board.dismiss_error();
        assert!(board.error_banner().is_none());
    }

    #[tokio::test]
    async fn test_manual_activation_resets_times() {
        let t = at(7, 45);
        let (mut board, store, _) = loaded_board(t).await;
        let shift = board.create_shift(new_shift("delivery", 9, 11)).await.unwrap();

        board.change_status(&shift.id, ShiftStatus::Active).await.unwrap();

        let active = board.shift(&shift.id).unwrap().clone();
        assert_eq!(active.status, ShiftStatus::Active);
        assert_eq!(active.start_time, t);
        assert_eq!(active.end_time, t + Duration::hours(2));
        assert_eq!(store.get_by_id(&shift.id).await.unwrap(), Some(active));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let (mut board, _, _) = loaded_board(at(8, 0)).await;
        let shift = board.create_shift(new_shift("audit", 9, 10)).await.unwrap();
        board.change_status(&shift.id, ShiftStatus::Terminated).await.unwrap();

        let r = board.change_status(&shift.id, ShiftStatus::Active).await;

        assert!(matches!(r, Err(BoardError::Lifecycle(LifecycleError::InvalidTransition { .. }))));
        assert_eq!(board.shift(&shift.id).unwrap().status, ShiftStatus::Terminated);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (mut board, _, _) = loaded_board(at(8, 0)).await;
        board.create_shift(new_shift("keep", 9, 10)).await.unwrap();

        board.delete_shift(&ShiftId::from("does-not-exist")).await.unwrap();

        assert_eq!(board.shifts().len(), 1);
        assert!(board.error_banner().is_none());
    }

    #[tokio::test]
    async fn test_update_overwrites_duration_and_keeps_status() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;
        let shift = board.create_shift(new_shift("stocking", 9, 10)).await.unwrap();

        let mut edited = shift.clone();
        edited.particulars = "stocking (aisle 4)".into();
        edited.end_time = at(12, 30);
        edited.status = ShiftStatus::Completed;
        let updated = board.update_shift(edited).await.unwrap();

        assert_eq!(updated.duration, 3.5);
        assert_eq!(updated.status, ShiftStatus::Scheduled);
        assert_eq!(store.get_by_id(&shift.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_unknown_shift() {
        let (mut board, _, _) = loaded_board(at(8, 0)).await;
        let (mut other, _, _) = loaded_board(at(8, 0)).await;
        let stranger = other.create_shift(new_shift("elsewhere", 9, 10)).await.unwrap();

        let r = board.update_shift(stranger).await;
        assert!(matches!(r, Err(BoardError::ShiftNotFound(_))));
    }

    /// A(10-11), B(11-13), C(13-14) -> [B, A, C]
    #[tokio::test]
    async fn test_reorder_recalculates_and_persists_chain() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;
        let a = board.create_shift(new_shift("A", 10, 11)).await.unwrap();
        let b = board.create_shift(new_shift("B", 11, 13)).await.unwrap();
        let c = board.create_shift(new_shift("C", 13, 14)).await.unwrap();

        board.reorder(&b.id, ReorderTarget::First).await.unwrap();

        let seq: Vec<_> = board
            .shifts()
            .iter()
            .map(|s| (s.particulars.as_str(), s.start_time, s.end_time))
            .collect();
        assert_eq!(
            seq,
            vec![
                ("B", at(11, 0), at(13, 0)),
                ("A", at(13, 0), at(14, 0)),
                ("C", at(14, 0), at(15, 0)),
            ]
        );

        let stored_a = store.get_by_id(&a.id).await.unwrap().unwrap();
        let stored_c = store.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored_a.start_time, at(13, 0));
        assert_eq!(stored_c.end_time, at(15, 0));

        // 再読み込みしても同じ並びになる (start_time 順)
        board.reload().await.unwrap();
        let names: Vec<_> = board.shifts().iter().map(|s| s.particulars.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_reorder_partial_failure_leaves_memory_untouched() {
        let store = Arc::new(FlakyStore::new().await);
        let clock = Arc::new(ManualClock::new(at(8, 0)));
        let mut board = ShiftBoard::new(store.clone(), clock);
        board.load().await.unwrap();

        let a = board.create_shift(new_shift("A", 10, 11)).await.unwrap();
        let b = board.create_shift(new_shift("B", 11, 13)).await.unwrap();
        board.create_shift(new_shift("C", 13, 14)).await.unwrap();
        let before = board.shifts().to_vec();

        // 3件中1件だけ書けて失敗する
        store.fail_writes_after(1);
        let r = board.reorder(&b.id, ReorderTarget::First).await;

        assert!(matches!(r, Err(BoardError::Store(_))));
        assert_eq!(board.shifts(), before.as_slice());
        assert_eq!(board.shift(&a.id).unwrap().start_time, at(10, 0));
        assert!(board.error_banner().is_some());
    }

    #[tokio::test]
    async fn test_sweep_completes_and_activates_next() {
        let (mut board, store, clock) = loaded_board(at(8, 0)).await;
        let first = board.create_shift(new_shift("first", 9, 10)).await.unwrap();
        let second = board.create_shift(new_shift("second", 10, 12)).await.unwrap();
        board.create_shift(new_shift("third", 12, 13)).await.unwrap();

        // 8:00 に開始 -> 9:00 終了
        board.change_status(&first.id, ShiftStatus::Active).await.unwrap();
        assert!(board.sweep().await.unwrap().is_empty());

        let now = at(9, 0) + Duration::seconds(1);
        clock.set(now);
        let plan = board.sweep().await.unwrap();

        assert_eq!(plan.completed, vec![first.id.clone()]);
        assert_eq!(plan.activated, Some(second.id.clone()));
        assert_eq!(board.shift(&first.id).unwrap().status, ShiftStatus::Completed);

        let started = board.shift(&second.id).unwrap().clone();
        assert_eq!(started.status, ShiftStatus::Active);
        assert_eq!(started.start_time, now);
        assert_eq!(started.end_time, now + Duration::hours(2));
        assert_eq!(store.get_by_id(&second.id).await.unwrap(), Some(started));

        let active = board.shifts_with_status(ShiftStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_display_order_puts_active_first() {
        let (mut board, _, _) = loaded_board(at(8, 0)).await;
        let a = board.create_shift(new_shift("a", 9, 10)).await.unwrap();
        let b = board.create_shift(new_shift("b", 10, 11)).await.unwrap();
        board.change_status(&a.id, ShiftStatus::Terminated).await.unwrap();
        board.change_status(&b.id, ShiftStatus::Active).await.unwrap();

        let names: Vec<_> = board.display_shifts().iter().map(|s| s.particulars.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_shifts_between_uses_inclusive_bounds() {
        let (mut board, _, _) = loaded_board(at(8, 0)).await;
        board.create_shift(new_shift("early", 6, 7)).await.unwrap();
        board.create_shift(new_shift("nine", 9, 10)).await.unwrap();
        board.create_shift(new_shift("noon", 12, 13)).await.unwrap();

        let found = board.shifts_between(at(9, 0), at(12, 0)).await.unwrap();
        let names: Vec<_> = found.iter().map(|s| s.particulars.as_str()).collect();
        assert_eq!(names, vec!["nine", "noon"]);
    }

    #[tokio::test]
    async fn test_load_failure_sets_failed_state() {
        let store = Arc::new(FlakyStore::new().await);
        let existing = Shift::create(new_shift("x", 9, 10)).unwrap();
        store.inner().create(&existing).await.unwrap();
        store.fail_reads(true);
        let mut board = ShiftBoard::new(store.clone(), Arc::new(ManualClock::new(at(8, 0))));

        assert!(board.load().await.is_err());
        assert!(matches!(board.state(), LoadState::Failed(_)));
        assert!(board.shifts().is_empty());

        // 読み込み前の操作は拒否
        let r = board.create_shift(new_shift("y", 10, 11)).await;
        assert!(matches!(r, Err(BoardError::NotLoaded)));
        assert!(board.sweep().await.unwrap().is_empty());

        store.fail_reads(false);
        board.reload().await.unwrap();
        assert_eq!(board.state(), &LoadState::Ready);
        assert_eq!(board.shifts().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_export_and_import() {
        let (mut source, _, _) = loaded_board(at(8, 0)).await;
        source.create_shift(new_shift("one", 9, 10)).await.unwrap();
        source.create_shift(new_shift("two", 10, 12)).await.unwrap();
        let json = source.export_snapshot().unwrap();

        let (mut target, target_store, _) = loaded_board(at(8, 0)).await;
        let stale = target.create_shift(new_shift("stale", 7, 8)).await.unwrap();

        let imported = target.import_snapshot(&json).await.unwrap();

        assert_eq!(imported, 2);
        assert_eq!(target.shifts(), source.shifts());
        assert_eq!(target_store.get_by_id(&stale.id).await.unwrap(), None);
        assert_eq!(target_store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_garbage() {
        let store = Arc::new(SqliteShiftStore::in_memory().await.unwrap());
        let mut board = ShiftBoard::new(store, Arc::new(ManualClock::new(at(8, 0))));
        board.load().await.unwrap();

        let r = board.import_snapshot("{\"shifts\": 3}").await;
        assert!(matches!(r, Err(BoardError::Snapshot(_))));
    }

    fn names(board: &ShiftBoard) -> Vec<String> {
        board.shifts().iter().map(|s| s.particulars.clone()).collect()
    }

    #[tokio::test]
    async fn test_collection_order_survives_reload() {
        let (mut board, _, _) = loaded_board(at(7, 0)).await;
        board.create_shift(new_shift("A", 10, 11)).await.unwrap();
        board.create_shift(new_shift("B", 8, 9)).await.unwrap();
        let c = board.create_shift(new_shift("C", 12, 13)).await.unwrap();
        assert_eq!(names(&board), vec!["B", "A", "C"]);

        // 手動起動で start_time が now (7:00) に移る
        board.change_status(&c.id, ShiftStatus::Active).await.unwrap();
        let before = names(&board);
        assert_eq!(before, vec!["C", "B", "A"]);

        board.reload().await.unwrap();
        assert_eq!(names(&board), before);

        board.reorder(&c.id, ReorderTarget::Position(2)).await.unwrap();
        let before = names(&board);
        board.reload().await.unwrap();
        assert_eq!(names(&board), before);
    }

    #[tokio::test]
    async fn test_same_start_order_survives_reload() {
        let (mut board, _, _) = loaded_board(at(7, 0)).await;
        for name in ["x", "y", "z"] {
            board.create_shift(new_shift(name, 9, 10)).await.unwrap();
        }
        let before: Vec<ShiftId> = board.shifts().iter().map(|s| s.id.clone()).collect();

        board.reload().await.unwrap();

        let after: Vec<ShiftId> = board.shifts().iter().map(|s| s.id.clone()).collect();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_import_rejects_duplicate_ids() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;
        let kept = board.create_shift(new_shift("kept", 9, 10)).await.unwrap();

        let twin = Shift::create(new_shift("twin", 10, 11)).unwrap();
        let mut other = twin.clone();
        other.particulars = "other".into();
        let json = serde_json::to_string(&ShiftSnapshot {
            shifts: vec![twin.clone(), other],
        })
        .unwrap();

        let r = board.import_snapshot(&json).await;

        assert!(matches!(r, Err(BoardError::DuplicateSnapshotId(id)) if id == twin.id));
        assert!(board.error_banner().is_some());
        assert_eq!(board.shifts(), &[kept.clone()]);
        assert_eq!(store.get_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_sub_millisecond_shift_keeps_valid_range() {
        let dir = tempfile::tempdir().unwrap();
        let primary = Arc::new(SqliteShiftStore::in_memory().await.unwrap());
        let secondary = Arc::new(JsonFileShiftStore::new(dir.path().join("shifts.json")));
        let store = Arc::new(FallbackShiftStore::new(primary.clone(), secondary));
        let now = at(8, 0);
        let mut board = ShiftBoard::new(store.clone(), Arc::new(ManualClock::new(now)));
        board.load().await.unwrap();

        let shift = board
            .create_shift(NewShift {
                particulars: "blink".into(),
                start_time: at(9, 0),
                end_time: at(9, 0) + Duration::microseconds(500),
                notes: String::new(),
            })
            .await
            .unwrap();
        board.change_status(&shift.id, ShiftStatus::Active).await.unwrap();

        let active = board.shift(&shift.id).unwrap().clone();
        assert_eq!(active.start_time, now);
        assert_eq!(active.end_time, now + Duration::microseconds(500));
        assert!(!store.is_degraded());
        assert_eq!(primary.get_by_id(&shift.id).await.unwrap(), Some(active));
    }

    #[tokio::test]
    async fn test_years_past_9999_are_rejected_before_storage() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;

        let r = board
            .create_shift(NewShift {
                particulars: "millennium".into(),
                start_time: Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(10000, 1, 1, 1, 0, 0).unwrap(),
                notes: String::new(),
            })
            .await;

        assert!(matches!(
            r,
            Err(BoardError::Lifecycle(LifecycleError::UnsupportedTimestamp(_)))
        ));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activation_past_latest_year_reports_error() {
        let (mut board, store, _) = loaded_board(at(8, 0)).await;
        let huge = board
            .create_shift(NewShift {
                particulars: "huge".into(),
                start_time: Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap(),
                notes: String::new(),
            })
            .await
            .unwrap();

        let r = board.change_status(&huge.id, ShiftStatus::Active).await;

        assert!(matches!(
            r,
            Err(BoardError::Lifecycle(LifecycleError::ScheduleOverflow { .. }))
        ));
        assert!(board.error_banner().is_some());
        assert_eq!(board.shift(&huge.id), Some(&huge));
        assert_eq!(store.get_by_id(&huge.id).await.unwrap(), Some(huge));
    }
}
