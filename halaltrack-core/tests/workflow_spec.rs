use speculate2::speculate;

speculate! {
    use chrono::{Duration, Utc};
    use halaltrack_core::models::{CreateTaskInput, CreateUserInput, Role, SlaConfig, Stage, TaskStatus, UpdateTaskInput};
    use halaltrack_core::workflow::{self, AdvanceOutcome};
    use halaltrack_core::{reduce, Action, AppState, Database};

    fn setup_db() -> Database {
        let db = Database::open_memory().expect("Failed to create test database");
        db.migrate().expect("Failed to migrate");
        db
    }

    describe "task lifecycle" {
        it "walks a task from Submitted to Certified" {
            let db = setup_db();
            let start = Utc::now() - Duration::days(30);
            let task = db
                .create_task(CreateTaskInput::new("Kecap Manis", "PT Sedap Jaya"), "siti", start)
                .expect("Failed to create task");

            let mut visited = vec![task.stage];
            for day in 1..=10 {
                let (task, _) = db
                    .advance_task(task.id, start + Duration::days(day))
                    .expect("Failed to advance")
                    .expect("Task missing");
                visited.push(task.stage);
            }
            visited.dedup();

            assert_eq!(visited, Stage::ALL[Stage::Submitted.index()..].to_vec());
        }

        it "keeps created_at and only moves stage_updated_at on advance" {
            let db = setup_db();
            let created = Utc::now() - Duration::days(3);
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", created)
                .unwrap();

            let later = created + Duration::days(2);
            let (advanced, outcome) = db.advance_task(task.id, later).unwrap().unwrap();

            assert!(outcome.is_advanced());
            assert_eq!(advanced.created_at, task.created_at);
            assert_eq!(advanced.stage_updated_at, later);
        }

        it "leaves a certified task untouched" {
            let db = setup_db();
            let mut input = CreateTaskInput::new("Kecap", "PT A");
            input.stage = Some(Stage::Certified);
            let task = db.create_task(input, "siti", Utc::now()).unwrap();

            let (after, outcome) = db.advance_task(task.id, Utc::now()).unwrap().unwrap();

            assert_eq!(outcome, AdvanceOutcome::AtFinalStage);
            assert_eq!(after.stage, Stage::Certified);
            assert_eq!(after.stage_updated_at, task.stage_updated_at);
        }

        it "refuses to advance a held task until resumed" {
            let db = setup_db();
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", Utc::now())
                .unwrap();

            let held = db.toggle_hold(task.id).unwrap().unwrap();
            assert_eq!(held.status, TaskStatus::OnHold);
            let (_, outcome) = db.advance_task(task.id, Utc::now()).unwrap().unwrap();
            assert_eq!(outcome, AdvanceOutcome::OnHold);

            db.toggle_hold(task.id).unwrap();
            let (resumed, outcome) = db.advance_task(task.id, Utc::now()).unwrap().unwrap();
            assert!(outcome.is_advanced());
            assert_eq!(resumed.stage, Stage::Pricing);
        }

        it "edits fields without touching the stage" {
            let db = setup_db();
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", Utc::now())
                .unwrap();

            let updated = db
                .update_task(
                    task.id,
                    UpdateTaskInput {
                        company: Some("PT B".into()),
                        contact_email: Some("halal@ptb.co.id".into()),
                        ..Default::default()
                    },
                )
                .unwrap()
                .unwrap();

            assert_eq!(updated.company, "PT B");
            assert_eq!(updated.contact_email.as_deref(), Some("halal@ptb.co.id"));
            assert_eq!(updated.name, "Kecap");
            assert_eq!(updated.stage, task.stage);
        }
    }

    describe "checklists" {
        it "gives every stage its default items, all incomplete" {
            let db = setup_db();
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", Utc::now())
                .unwrap();

            for stage in Stage::ALL {
                let labels: Vec<&str> = task.checklist_for(stage).iter().map(|item| item.label.as_str()).collect();
                assert_eq!(labels, stage.default_checklist().to_vec());
                assert!(task.checklist_for(stage).iter().all(|item| !item.completed));
            }
        }

        it "flips one item and leaves the rest alone" {
            let db = setup_db();
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", Utc::now())
                .unwrap();
            let target = task.checklist_for(Stage::Audit)[0].id;

            let toggled = db.toggle_checklist_item(task.id, target).unwrap().unwrap();

            assert_eq!(workflow::checklist_progress(&toggled, Stage::Audit).0, 1);
            let completed: usize = Stage::ALL
                .iter()
                .map(|stage| workflow::checklist_progress(&toggled, *stage).0)
                .sum();
            assert_eq!(completed, 1);
        }

        it "goes away with its task" {
            let db = setup_db();
            let task = db
                .create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", Utc::now())
                .unwrap();
            let item = task.checklist_for(Stage::Review)[0].id;

            assert!(db.delete_task(task.id).unwrap());

            assert!(db.get_task(task.id).unwrap().is_none());
            assert!(db.toggle_checklist_item(task.id, item).unwrap().is_none());
        }
    }

    describe "SLA" {
        it "flags overdue tasks using stored limits" {
            let db = setup_db();
            let now = Utc::now();
            let mut input = CreateTaskInput::new("Kecap", "PT A");
            input.stage = Some(Stage::Audit);
            let task = db.create_task(input, "siti", now - Duration::days(5)).unwrap();

            let defaults = db.get_sla_config().unwrap();
            assert!(!workflow::is_overdue(&task, &defaults, now));

            let mut tighter = defaults.clone();
            tighter.set(Stage::Audit, 5);
            let saved = db.save_sla_config(&tighter).unwrap();
            assert!(workflow::is_overdue(&task, &saved, now));

            tighter.set(Stage::Audit, 0);
            let disabled = db.save_sla_config(&tighter).unwrap();
            assert!(!workflow::is_overdue(&task, &disabled, now));
        }

        it "persists settings across reopen" {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("halaltrack.db");
            {
                let db = Database::open(&path).unwrap();
                db.migrate().unwrap();
                let mut sla = SlaConfig::default();
                sla.set(Stage::FatwaSession, 9);
                db.save_sla_config(&sla).unwrap();
            }

            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();

            assert_eq!(db.get_sla_config().unwrap().limit_for(Stage::FatwaSession), 9);
            assert_eq!(db.get_sla_config().unwrap().limit_for(Stage::Audit), 7);
        }
    }

    describe "accounts" {
        it "signs a new account in under its synthetic email" {
            let db = setup_db();
            db.sign_up(CreateUserInput {
                username: "Siti".into(),
                password: "rahasia".into(),
                role: Role::Admin,
            })
            .unwrap();

            let session = db.sign_in("siti", "rahasia").unwrap();

            assert_eq!(session.user.username, "Siti");
            assert_eq!(session.user.role, Role::Admin);
            assert_eq!(db.session_user(&session.token).unwrap().unwrap().id, session.user.id);
            assert!(db.sign_in("siti", "salah").is_err());
        }
    }

    describe "dashboard state" {
        it "builds the board and stats from stored tasks" {
            let db = setup_db();
            let now = Utc::now();
            let kecap = db.create_task(CreateTaskInput::new("Kecap", "PT A"), "siti", now).unwrap();
            db.create_task(CreateTaskInput::new("Sambal", "PT B"), "siti", now).unwrap();
            db.advance_task(kecap.id, now).unwrap();

            let mut state = AppState::default();
            reduce(
                &mut state,
                Action::Loaded {
                    tasks: db.get_all_tasks().unwrap(),
                    sla: db.get_sla_config().unwrap(),
                },
            );

            let board = state.board();
            assert_eq!(board.len(), Stage::ALL.len());
            assert_eq!(board[Stage::Pricing.index()].1[0].name, "Kecap");
            assert_eq!(board[Stage::Submitted.index()].1[0].name, "Sambal");

            let stats = workflow::stats(&state.tasks, &state.sla, now);
            assert_eq!(stats.total, 2);
            assert_eq!(stats.completed, 0);
            assert_eq!(stats.completion_rate, 0);
        }
    }
}
