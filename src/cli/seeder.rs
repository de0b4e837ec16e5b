use std::time::Instant;

use chrono::{Datelike, Duration, Utc};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use cuaderno_core::password::hash_password_with_cost;

use crate::modules::commissions::model::Shift;
use crate::modules::evaluations::model::EvaluationKind;
use crate::modules::users::model::{UserId, UserRole};

/// Seeded subjects carry this code prefix so they can be cleared later.
pub const SEED_SUBJECT_PREFIX: &str = "SEED-";
pub const SEED_EMAIL_DOMAIN: &str = "example.com";
pub const SEED_PASSWORD: &str = "password123";

const SUBJECT_NAMES: [&str; 12] = [
    "Análisis Matemático",
    "Álgebra y Geometría Analítica",
    "Algoritmos y Estructuras de Datos",
    "Arquitectura de Computadoras",
    "Sistemas Operativos",
    "Sintaxis y Semántica de los Lenguajes",
    "Paradigmas de Programación",
    "Bases de Datos",
    "Redes de Datos",
    "Ingeniería de Software",
    "Física",
    "Probabilidad y Estadística",
];

const SHIFTS: [Shift; 3] = [Shift::Morning, Shift::Afternoon, Shift::Night];

/// Weekdays (Monday to Friday) times two-hour blocks from 08:00 to 22:00.
const SLOTS_PER_PROFESSOR: usize = 5 * 7;

// SQLite caps bound parameters at 32766 per statement
const USER_BATCH_SIZE: usize = 1000;
const ENROLLMENT_BATCH_SIZE: usize = 5000;

#[derive(Debug, Clone, Copy)]
pub struct SeedCounts {
    pub subjects: usize,
    pub commissions_per_subject: usize,
    pub professors: usize,
    pub students: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            subjects: 8,
            commissions_per_subject: 2,
            professors: 6,
            students: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub subjects: usize,
    pub commissions: usize,
    pub enrollments: usize,
    pub schedules: usize,
    pub evaluations: usize,
}

struct UserSeed {
    first_name: String,
    last_name: String,
    email: String,
    role: UserRole,
}

struct SubjectSeed {
    code: String,
    name: String,
    description: String,
    year: i64,
}

/// Seeds users, subjects, commissions, enrollments, one weekly session per
/// commission and one exam per subject.
///
/// Every seeded account shares [`SEED_PASSWORD`], hashed once at a low cost.
pub async fn seed_database(
    db: &SqlitePool,
    counts: SeedCounts,
) -> Result<SeedReport, Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    println!("🌱 Starting database seeding...");
    println!(
        "   - {} subjects x {} commissions, {} professors, {} students",
        counts.subjects, counts.commissions_per_subject, counts.professors, counts.students
    );

    println!("\n🔧 Generating fake data in parallel...");
    let gen_start = Instant::now();
    let professors = generate_users(UserRole::Professor, counts.professors);
    let students = generate_users(UserRole::Student, counts.students);
    let subjects = generate_subjects(counts.subjects);
    println!(
        "   ✓ Generated {} users and {} subjects in {:?}",
        professors.len() + students.len(),
        subjects.len(),
        gen_start.elapsed()
    );

    println!("\n🔐 Hashing password...");
    let password_hash = hash_password_with_cost(SEED_PASSWORD, 4)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;
    let mut report = SeedReport::default();

    println!("\n👥 Inserting users in batches...");
    let professor_ids = insert_users(&mut tx, &professors, &password_hash).await?;
    let student_ids = insert_users(&mut tx, &students, &password_hash).await?;
    report.users = professor_ids.len() + student_ids.len();

    println!("\n📚 Inserting subjects and commissions...");
    let current_year = i64::from(Utc::now().year());
    let mut commission_ids = Vec::new();
    for subject in &subjects {
        let subject_id: i64 = sqlx::query_scalar(
            "INSERT INTO subjects (code, name, description, year) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&subject.code)
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(subject.year)
        .fetch_one(&mut *tx)
        .await?;
        report.subjects += 1;

        for index in 0..counts.commissions_per_subject {
            let commission_id: i64 = sqlx::query_scalar(
                "INSERT INTO commissions (subject_id, name, year, shift) VALUES (?, ?, ?, ?) RETURNING id",
            )
            .bind(subject_id)
            .bind(format!("K{}{:02}", subject.year, index + 1))
            .bind(current_year)
            .bind(SHIFTS[index % SHIFTS.len()])
            .fetch_one(&mut *tx)
            .await?;
            commission_ids.push((subject_id, index, commission_id));
        }

        sqlx::query(
            "INSERT INTO evaluations (subject_id, title, description, kind, scheduled_for, max_score)
             VALUES (?, ?, ?, ?, ?, 10)",
        )
        .bind(subject_id)
        .bind(format!("Primer parcial de {}", subject.name))
        .bind(Sentence(4..10).fake::<String>())
        .bind(EvaluationKind::Exam)
        .bind((Utc::now() + Duration::days(30)).date_naive())
        .execute(&mut *tx)
        .await?;
        report.evaluations += 1;
    }
    report.commissions = commission_ids.len();

    println!("\n📝 Enrolling students...");
    let enrollments: Vec<(i64, UserId)> = commission_ids
        .iter()
        .flat_map(|&(_, index, commission_id)| {
            student_ids
                .iter()
                .enumerate()
                .filter(move |(position, _)| position % counts.commissions_per_subject == index)
                .map(move |(_, &student_id)| (commission_id, student_id))
        })
        .collect();
    for chunk in enrollments.chunks(ENROLLMENT_BATCH_SIZE) {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT OR IGNORE INTO commission_students (commission_id, student_id) ",
        );
        query.push_values(chunk, |mut row, (commission_id, student_id)| {
            row.push_bind(*commission_id).push_bind(*student_id);
        });
        report.enrollments += query.build().execute(&mut *tx).await?.rows_affected() as usize;
    }

    println!("\n🗓️  Scheduling sessions...");
    if !professor_ids.is_empty() {
        for (n, &(subject_id, _, commission_id)) in commission_ids.iter().enumerate() {
            let slot = n / professor_ids.len();
            if slot >= SLOTS_PER_PROFESSOR {
                break;
            }
            let day_of_week = (slot % 5) as i64 + 1;
            let start_hour = 8 + 2 * (slot / 5);

            sqlx::query(
                "INSERT INTO schedules
                     (subject_id, commission_id, professor_id, day_of_week, start_time, end_time, classroom)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(subject_id)
            .bind(commission_id)
            .bind(professor_ids[n % professor_ids.len()])
            .bind(day_of_week)
            .bind(format!("{start_hour:02}:00"))
            .bind(format!("{:02}:00", start_hour + 2))
            .bind(format!("Aula {}", n + 1))
            .execute(&mut *tx)
            .await?;
            report.schedules += 1;
        }
    }

    tx.commit().await?;

    println!(
        "\n✅ Seeding complete! {} users, {} subjects, {} commissions, {} enrollments, {} sessions, {} evaluations in {:?}",
        report.users,
        report.subjects,
        report.commissions,
        report.enrollments,
        report.schedules,
        report.evaluations,
        start_time.elapsed()
    );
    println!("\n📝 Default password for all users: {SEED_PASSWORD}");

    Ok(report)
}

fn generate_users(role: UserRole, count: usize) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|index| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}+{}{}@{SEED_EMAIL_DOMAIN}",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                role.as_str(),
                index
            );

            UserSeed {
                first_name,
                last_name,
                email,
                role,
            }
        })
        .collect()
}

fn generate_subjects(count: usize) -> Vec<SubjectSeed> {
    (0..count)
        .into_par_iter()
        .map(|index| {
            let base = SUBJECT_NAMES[index % SUBJECT_NAMES.len()];
            let round = index / SUBJECT_NAMES.len();
            let name = if round == 0 {
                base.to_string()
            } else {
                format!("{base} {}", round + 1)
            };

            SubjectSeed {
                code: format!("{SEED_SUBJECT_PREFIX}{:03}", index + 1),
                name,
                description: Sentence(6..14).fake(),
                year: (index % 5) as i64 + 1,
            }
        })
        .collect()
}

async fn insert_users(
    tx: &mut Transaction<'_, Sqlite>,
    users: &[UserSeed],
    password_hash: &str,
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    let mut ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(USER_BATCH_SIZE) {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO users (first_name, last_name, email, password, role) ",
        );
        query.push_values(chunk, |mut row, user| {
            row.push_bind(&user.first_name)
                .push_bind(&user.last_name)
                .push_bind(&user.email)
                .push_bind(password_hash)
                .push_bind(user.role);
        });
        query.push(" RETURNING id");

        let chunk_ids: Vec<UserId> = query.build_query_scalar().fetch_all(&mut **tx).await?;
        ids.extend(chunk_ids);
    }

    println!("   ✓ Inserted {} users", ids.len());
    Ok(ids)
}

/// Removes seeded subjects (cascading to their commissions, sessions,
/// contents and evaluations) and seeded accounts. Admins are kept.
pub async fn clear_seeded_data(db: &SqlitePool) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    let subjects_deleted = sqlx::query("DELETE FROM subjects WHERE code LIKE ?")
        .bind(format!("{SEED_SUBJECT_PREFIX}%"))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let users_deleted = sqlx::query("DELETE FROM users WHERE email LIKE ? AND role != ?")
        .bind(format!("%@{SEED_EMAIL_DOMAIN}"))
        .bind(UserRole::Admin)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} users and {} subjects in {:?}",
        users_deleted,
        subjects_deleted,
        start_time.elapsed()
    );
    println!("✅ Seeded data cleared successfully!");

    Ok((users_deleted, subjects_deleted))
}
