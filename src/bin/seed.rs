use std::{str::FromStr, sync::Arc};

use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{
        internet::en::SafeEmail,
        lorem::en::{Paragraph, Sentence, Words},
        name::en::Name,
    },
    Fake,
};
use rand::seq::SliceRandom;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use clubhouse::{
    config::Settings,
    domain::*,
    email::LogEmailSender,
    service::ServiceContext,
};

const DEPARTMENTS: &[&str] = &["CSE", "ECE", "EEE", "MECH", "CIVIL"];
const TAGS: &[&str] = &["rust", "web", "ai", "security", "hardware", "career"];
const STACKS: &[&str] = &["Rust", "TypeScript", "Python", "SQLite", "React", "Go"];

/// Fill a development database with an admin, members, activities and content.
#[derive(Parser, Debug)]
#[command(name = "seed")]
struct Args {
    /// SQLite connection string
    #[arg(long, default_value = "sqlite:clubhouse.db")]
    database_url: String,

    /// Number of regular members to create
    #[arg(long, default_value_t = 20)]
    members: usize,

    /// Number of events to create
    #[arg(long, default_value_t = 5)]
    events: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("Seeding {}", args.database_url);

    let options = SqliteConnectOptions::from_str(&args.database_url)?.create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let settings = Settings::default();
    let ctx = ServiceContext::new(db_pool, &settings, Arc::new(LogEmailSender));
    let mut rng = rand::thread_rng();

    let admin = create_verified(&ctx, "Club Admin".to_string(), "admin@clubhouse.local".to_string(), Some("CSE")).await?;
    let admin = ctx.member_repo.update_role(admin.id, MemberRole::Admin).await?;
    println!("  created admin {} (admin@clubhouse.local / admin12345)", admin.unique_id.as_deref().unwrap_or("-"));

    let mut members = Vec::with_capacity(args.members);
    for _ in 0..args.members {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        let department = DEPARTMENTS.choose(&mut rng).copied();

        match create_verified(&ctx, name, email, department).await {
            Ok(member) => members.push(member),
            Err(e) => println!("  skipped a member: {}", e),
        }
    }
    println!("  created {} members", members.len());

    let mut events = Vec::with_capacity(args.events);
    for i in 0..args.events {
        let start = Utc::now() + Duration::days(7 * (i as i64 + 1));
        let title: String = Sentence(3..6).fake();
        let event = ctx.activity_service
            .create_event(
                EventRequest {
                    title: title.trim_end_matches('.').to_string(),
                    description: Paragraph(2..4).fake(),
                    location: Some("Main Auditorium".to_string()),
                    start_time: start,
                    end_time: Some(start + Duration::hours(2)),
                    capacity: Some(50),
                    image_url: None,
                    is_published: true,
                },
                admin.id,
            )
            .await?;
        events.push(event);
    }
    println!("  created {} events", events.len());

    let start = Utc::now() + Duration::days(10);
    let workshop = ctx.activity_service
        .create_workshop(
            WorkshopRequest {
                title: "Intro to Systems Programming".to_string(),
                description: Paragraph(2..4).fake(),
                instructor: Some(admin.name.clone()),
                location: Some("Lab 3".to_string()),
                start_time: start,
                end_time: Some(start + Duration::hours(3)),
                capacity: Some(20),
                requires_approval: true,
                image_url: None,
                is_published: true,
            },
            admin.id,
        )
        .await?;
    println!("  created workshop {}", workshop.title);

    let mut registrations = 0;
    for member in &members {
        if let Some(event) = events.choose(&mut rng) {
            if ctx.registration_service
                .register(ActivityKind::Event, event.id, member.id)
                .await
                .is_ok()
            {
                registrations += 1;
            }
        }
    }
    println!("  created {} event registrations", registrations);

    for (i, member) in members.iter().take(6).enumerate() {
        let words: Vec<String> = Words(3..6).fake();
        let tags = TAGS.choose_multiple(&mut rng, 2).map(|t| t.to_string()).collect();
        let blog = ctx.blog_service
            .submit(
                member.id,
                BlogRequest {
                    title: format!("Notes on {}", words.join(" ")),
                    content: Paragraph(6..10).fake(),
                    excerpt: None,
                    tags,
                    cover_image_url: None,
                },
            )
            .await?;

        if i % 2 == 0 {
            ctx.blog_service.approve(blog.id).await?;
        }

        let tech_stack = STACKS.choose_multiple(&mut rng, 3).map(|t| t.to_string()).collect();
        let project = ctx.project_service
            .submit(
                member.id,
                ProjectRequest {
                    title: format!("{} tracker", words[0]),
                    description: Paragraph(3..5).fake(),
                    tech_stack,
                    repo_url: Some(format!("https://github.com/example/{}", words[0])),
                    demo_url: None,
                    image_url: None,
                },
            )
            .await?;

        if i % 3 == 0 {
            ctx.project_service.approve(project.id).await?;
        }
    }
    println!("  created blogs and projects");

    println!("Seeding complete");
    Ok(())
}

async fn create_verified(
    ctx: &ServiceContext,
    name: String,
    email: String,
    department: Option<&str>,
) -> anyhow::Result<Member> {
    let registered = ctx.member_service
        .register(RegisterRequest {
            name,
            email,
            password: "admin12345".to_string(),
            department: department.map(str::to_string),
            year: Some(2),
        })
        .await?;

    let member = ctx.member_service.verify_email(&registered.verification_token).await?;
    Ok(member)
}
