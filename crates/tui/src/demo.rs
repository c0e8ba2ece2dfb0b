//! Seed data for running the board without a remote store.

use chrono::NaiveDate;
use kanban::{Assignee, MemoryTaskStore, Priority, Project, StatusSequence, Task, TaskStatus};

pub const PROJECT_ID: &str = "demo-tower";

pub fn demo_store(sequence: StatusSequence) -> MemoryTaskStore {
    let projects = vec![
        Project {
            id: PROJECT_ID.to_string(),
            name: "Riverside Office Tower".to_string(),
            code: Some("RVT-01".to_string()),
            client: Some("Riverside Development".to_string()),
        },
        Project {
            id: "demo-bridge".to_string(),
            name: "Canal Footbridge".to_string(),
            code: Some("CFB-02".to_string()),
            client: None,
        },
    ];

    let rows: [(&str, &str, TaskStatus, Priority, Option<(&str, &str)>, &[&str], u8); 8] = [
        ("T001", "Survey existing site conditions", TaskStatus::Completed, Priority::High, Some(("Linh Tran", "Surveyor")), &["site"], 100),
        ("T002", "Structural model LOD 300", TaskStatus::S0, Priority::High, Some(("Minh Pham", "Structural Engineer")), &["structure", "model"], 45),
        ("T003", "MEP clash detection round 1", TaskStatus::S1, Priority::Medium, Some(("An Nguyen", "BIM Coordinator")), &["mep", "clash"], 60),
        ("T004", "Issue architectural drawings for review", TaskStatus::S3, Priority::Medium, None, &["drawings"], 80),
        ("T005", "Fire strategy approval", TaskStatus::S4, Priority::High, Some(("Hoa Le", "Fire Engineer")), &["compliance"], 90),
        ("T006", "Facade mock-up procurement", TaskStatus::Open, Priority::Low, None, &[], 0),
        ("T007", "Update cost plan from model quantities", TaskStatus::S2, Priority::Medium, Some(("Quan Do", "Quantity Surveyor")), &["cost"], 30),
        ("T008", "Legacy permit record", TaskStatus::parse("Archived"), Priority::Low, None, &[], 100),
    ];

    let tasks = rows
        .into_iter()
        .enumerate()
        .map(|(i, (code, title, status, priority, assignee, tags, progress))| {
            let mut task = Task::new(format!("demo-{}", i + 1), code, title, status);
            task.project_id = PROJECT_ID.to_string();
            task.priority = priority;
            task.progress = progress;
            task.tags = tags.iter().map(|t| t.to_string()).collect();
            task.assignee = assignee.map(|(name, role)| Assignee {
                name: name.to_string(),
                avatar: None,
                role: Some(role.to_string()),
            });
            task.start_date = NaiveDate::from_ymd_opt(2024, 1, 8 + i as u32);
            task.due_date = NaiveDate::from_ymd_opt(2024, 3, 1 + 3 * i as u32);
            task
        })
        .collect();

    MemoryTaskStore::with_tasks(sequence, projects, tasks)
}
