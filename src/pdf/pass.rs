use std::fs;
use std::path::PathBuf;

use actix_web::web;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::info;
use uuid::Uuid;

use crate::model::leave_application::LeaveApplication;

/// Produces the printable pass for an approved leave application and returns
/// the storage-relative path it can be fetched from.
#[async_trait]
pub trait PassRenderer: Send + Sync {
    async fn render(&self, leave: &LeaveApplication) -> anyhow::Result<String>;
}

/// Writes a one-page A4 pass with lopdf into `output_dir`.
pub struct LopdfPassRenderer {
    output_dir: PathBuf,
    public_prefix: String,
}

impl LopdfPassRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PassRenderer for LopdfPassRenderer {
    async fn render(&self, leave: &LeaveApplication) -> anyhow::Result<String> {
        let filename = format!("leave-{}.pdf", leave.id());
        let lines = pass_lines(leave);
        let output_dir = self.output_dir.clone();
        let target = output_dir.join(&filename);
        let staging_name = format!("{}.{}.tmp", filename, Uuid::new_v4());

        web::block(move || -> anyhow::Result<()> {
            let bytes = build_pdf(&lines)?;
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("creating {}", output_dir.display()))?;

            // readers must never observe a half-written pass
            let staging = output_dir.join(staging_name);
            fs::write(&staging, bytes)
                .with_context(|| format!("writing {}", staging.display()))?;
            fs::rename(&staging, &target)
                .with_context(|| format!("moving pass into {}", target.display()))?;
            Ok(())
        })
        .await
        .map_err(|e| anyhow!("pass rendering was cancelled: {e}"))??;

        info!(leave_id = leave.id(), file = %filename, "Leave pass written");
        Ok(format!("{}/{}", self.public_prefix, filename))
    }
}

fn pass_lines(leave: &LeaveApplication) -> Vec<(f32, String)> {
    let student = leave.student_snapshot();
    let mut lines = vec![(20.0, "Leave Approval Pass".to_string())];

    lines.push((12.0, format!("Name: {}", student.name)));
    let optional = [
        ("Roll No", &student.roll_number),
        ("Branch", &student.branch),
        ("Year", &student.year),
        ("Hostel", &student.hostel),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            lines.push((12.0, format!("{label}: {value}")));
        }
    }

    lines.push((12.0, format!("Reason: {}", leave.reason())));
    lines.push((12.0, format!("From: {}", leave.from_date().format("%d %b %Y"))));
    lines.push((12.0, format!("To: {}", leave.to_date().format("%d %b %Y"))));
    if let Some(remarks) = leave.remarks() {
        lines.push((12.0, format!("Remarks: {remarks}")));
    }

    lines.push((12.0, format!("Approval mode: {}", leave.mode())));
    lines.push((12.0, format!("Faculty Status: {}", leave.faculty_status())));
    lines.push((12.0, format!("Rector Status: {}", leave.rector_status())));
    lines.push((
        12.0,
        format!("Issued on: {}", Utc::now().date_naive().format("%d %b %Y")),
    ));
    lines.push((12.0, String::new()));
    lines.push((
        12.0,
        "__________________________           __________________________".to_string(),
    ));
    lines.push((
        12.0,
        "   Faculty Signature                              Rector Signature".to_string(),
    ));
    lines
}

fn build_pdf(lines: &[(f32, String)]) -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = vec![Operation::new("BT", vec![])];
    let mut y = 780.0_f32;
    for (size, text) in lines {
        operations.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
        operations.push(Operation::new("Tm", vec![
            1.into(),
            0.into(),
            0.into(),
            1.into(),
            60.into(),
            y.into(),
        ]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(
            text.as_str(),
        )]));
        y -= size * 1.8;
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_application::{ApprovalMode, Decision};
    use crate::test_support::new_leave;

    fn approved_leave() -> LeaveApplication {
        let mut leave = LeaveApplication::submitted(42, new_leave(7, ApprovalMode::Rector));
        leave
            .record_rector_decision(30, &Decision::approve(), Utc::now())
            .expect("rector approves");
        leave
    }

    #[test]
    fn pass_lists_snapshot_and_decisions() {
        let lines: Vec<String> = pass_lines(&approved_leave())
            .into_iter()
            .map(|(_, text)| text)
            .collect();
        assert_eq!(lines[0], "Leave Approval Pass");
        assert!(lines.contains(&"Name: Asha Patil".to_string()));
        assert!(lines.contains(&"Roll No: CS-044".to_string()));
        assert!(lines.contains(&"Rector Status: approved".to_string()));
        assert!(lines.contains(&"Approval mode: rector".to_string()));
    }

    #[actix_web::test]
    async fn render_writes_pdf_under_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = LopdfPassRenderer::new(dir.path().join("passes"), "/uploads/");

        let path = renderer.render(&approved_leave()).await.expect("render");
        assert_eq!(path, "/uploads/leave-42.pdf");

        let written = fs::read(dir.path().join("passes").join("leave-42.pdf")).expect("file");
        assert!(written.starts_with(b"%PDF-1.5"));

        let leftovers = fs::read_dir(dir.path().join("passes"))
            .expect("dir")
            .filter(|entry| {
                entry
                    .as_ref()
                    .map(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[actix_web::test]
    async fn render_reports_unwritable_output_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").expect("write blocker");

        let renderer = LopdfPassRenderer::new(&blocker, "/uploads");
        assert!(renderer.render(&approved_leave()).await.is_err());
    }
}
