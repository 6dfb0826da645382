// ==========================================
// CreditImporter 集成测试
// ==========================================
// 测试目标: 验证完整的学分导入流程（内存表 + 文件）
// ==========================================


use credit_importer::config::ImportSettings;
use credit_importer::domain::{CellValue, IssueKind, DqLevel};
use credit_importer::importer::{
    CreditImporter, FileParser, ImportError, ImportRequest, UniversalFileParser,
};
use credit_importer::{BatchDedupPolicy, ColumnResolution, NumericPolicy};
use credit_importer::logging;
use tempfile::tempdir;
use test_helpers::{
    column_texts, copy_fixture, create_test_importer, date, default_importer, destination_sheet,
    source_sheet, write_sheet, write_workbook, SourceRow, DESTINATION_SHEET, SOURCE_SHEET,
};

// ==========================================
// 内存表导入
// ==========================================

#[test]
fn test_import_single_row_layout() {
    logging::init_test();

    let importer = default_importer();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Economics for CR")
        .course_no(CellValue::text("101"))
        .grade(CellValue::text("90"))
        .hours(CellValue::text("5"))]);
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .expect("Import should succeed");

    assert_eq!(summary.inserted, 1);
    assert_eq!(destination.last_row(), 2);

    let row = destination.row(2).unwrap();
    assert_eq!(
        row.cells,
        vec![
            CellValue::Int(1),
            CellValue::text("JANE DOE"),
            CellValue::text("S123"),
            CellValue::text("ECONOMICS FOR CR"),
            CellValue::Int(101),
            CellValue::Date(date(2024, 1, 8)),
            CellValue::Date(date(2024, 3, 1)),
            CellValue::Int(90),
            CellValue::text("Ms. Smith"),
            CellValue::text("5"),
            CellValue::text("http://x"),
            CellValue::Empty,
            CellValue::Empty,
        ]
    );
    assert!(row.format.bordered);
    assert_eq!(row.format.background, None);
}

#[test]
fn test_existing_key_is_not_inserted() {
    let importer = default_importer();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Economics for CR")]);
    let mut destination = destination_sheet(&[("JANE DOE", "S123", "economics for cr")]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(destination.last_row(), 2);
}

#[test]
fn test_unapproved_rows_are_skipped() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::unapproved("John Roe", "S200", "Biology"),
        SourceRow::approved("Ana Ramos", "S050", "Algebra I"),
        SourceRow::unapproved("Eve Zablocki", "S400", "Chemistry"),
    ]);
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.unapproved, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(column_texts(&destination, 3), vec!["S050"]);
}

#[test]
fn test_approval_cell_variants() {
    let importer = default_importer();
    let mut rows = Vec::new();
    for (idx, flag) in ["TRUE", "yes", "x", "FALSE", "no", "0", ""].iter().enumerate() {
        let mut row = SourceRow::approved("Student", &format!("S{}", idx), "Art");
        row.approved = CellValue::from(*flag);
        rows.push(row);
    }
    let source = source_sheet(&rows);

    let plan = importer.plan(&source, &destination_sheet(&[])).unwrap();
    assert_eq!(plan.records.len(), 3);
    assert_eq!(plan.unapproved, 4);
}

#[test]
fn test_index_and_order_after_import() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("zed young", "S300", "Art"),
        SourceRow::approved("Amy Bell", "S050", "Art"),
        SourceRow::approved("bob cho", "S250", "Art"),
    ]);
    let mut destination = destination_sheet(&[
        ("CARL DIAZ", "S100", "BIOLOGY"),
        ("DORA EVANS", "S400", "BIOLOGY"),
    ]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    // 序号为 1..N，N = 原有行数 + 插入行数
    assert_eq!(summary.inserted, 3);
    assert_eq!(
        column_texts(&destination, 1),
        vec!["1", "2", "3", "4", "5"]
    );
    // 按学号升序
    assert_eq!(
        column_texts(&destination, 3),
        vec!["S050", "S100", "S250", "S300", "S400"]
    );
    // 原有行不加边框，新行加边框
    assert!(!destination.row(3).unwrap().format.bordered);
    assert!(destination.row(2).unwrap().format.bordered);
}

#[test]
fn test_plan_orders_new_rows_by_name() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("zed young", "S1", "Art"),
        SourceRow::approved("Amy Bell", "S2", "Art"),
        SourceRow::approved("amy bell", "S3", "Music"),
        SourceRow::approved("Bob Cho", "S4", "Art"),
    ]);

    let plan = importer.plan(&source, &destination_sheet(&[])).unwrap();
    let ids: Vec<String> = plan.records.iter().map(|r| r.student_id.as_text()).collect();

    // 姓名相同（不区分大小写）时保持源表顺序
    assert_eq!(ids, vec!["S2", "S3", "S4", "S1"]);
}

#[test]
fn test_plan_orders_accented_names_alphabetically() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("Zoe Adams", "S1", "Art"),
        SourceRow::approved("Émile Roux", "S2", "Art"),
        SourceRow::approved("Eve Zablocki", "S3", "Art"),
    ]);

    let plan = importer.plan(&source, &destination_sheet(&[])).unwrap();
    let names: Vec<&str> = plan.records.iter().map(|r| r.student_name.as_str()).collect();

    assert_eq!(names, vec!["ÉMILE ROUX", "EVE ZABLOCKI", "ZOE ADAMS"]);
}

#[test]
fn test_second_run_is_idempotent() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Economics for CR"),
        SourceRow::approved("Ana Ramos", "S050", "Algebra I"),
    ]);
    let mut destination = destination_sheet(&[("BOB ADAMS", "S010", "GEOMETRY")]);

    let first = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();
    let after_first = destination.clone();
    let second = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(destination, after_first);
}

#[test]
fn test_padded_course_name_is_idempotent() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Economics for CR "),
        SourceRow::approved("Ana Ramos", "S050", "  Algebra I"),
    ]);
    let mut destination = destination_sheet(&[]);

    let first = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();
    let second = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(destination.last_row(), 3);
    assert_eq!(
        column_texts(&destination, 4),
        vec!["ALGEBRA I", "ECONOMICS FOR CR"]
    );
}

#[test]
fn test_empty_source_only_renumbers() {
    let importer = default_importer();
    let source = source_sheet(&[]);
    let mut destination = destination_sheet(&[
        ("DORA EVANS", "S400", "BIOLOGY"),
        ("CARL DIAZ", "S100", "BIOLOGY"),
    ]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(column_texts(&destination, 3), vec!["S100", "S400"]);
    assert_eq!(column_texts(&destination, 1), vec!["1", "2"]);
}

// ==========================================
// 批内去重策略
// ==========================================

#[test]
fn test_batch_duplicates_kept_with_snapshot_only() {
    let importer = default_importer();
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Biology"),
        SourceRow::approved("Jane Doe", "S123", "BIOLOGY"),
    ]);
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.batch_duplicates, 0);
}

#[test]
fn test_batch_duplicates_dropped_with_snapshot_and_batch() {
    let importer = create_test_importer(ImportSettings {
        batch_dedup_policy: BatchDedupPolicy::SnapshotAndBatch,
        ..ImportSettings::default()
    });
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Biology"),
        SourceRow::approved("Ana Ramos", "S050", "Biology"),
        SourceRow::approved("Jane Doe", "S123", "BIOLOGY"),
    ]);
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.batch_duplicates, 1);
    assert_eq!(column_texts(&destination, 3), vec!["S050", "S123"]);
}

// ==========================================
// 数值字段策略
// ==========================================

#[test]
fn test_malformed_numbers_permissive() {
    let importer = default_importer();
    let source = source_sheet(&[SourceRow::approved("Noah Garza", "S300", "World History")
        .course_no(CellValue::text("abc"))
        .grade(CellValue::text("A+"))]);
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.dq_report.summary.warning, 2);
    assert!(summary
        .dq_report
        .issues
        .iter()
        .all(|i| i.kind == IssueKind::MalformedField && i.row_number == 2));

    let row = destination.row(2).unwrap();
    assert_eq!(row.cell(4), &CellValue::Error("#NUM!".to_string()));
    assert_eq!(row.cell(7), &CellValue::Error("#NUM!".to_string()));
}

#[test]
fn test_numeric_prefix_parsing() {
    let importer = default_importer();
    let source = source_sheet(&[SourceRow::approved("Noah Garza", "S300", "History")
        .course_no(CellValue::text("12abc"))
        .grade(CellValue::Float(89.6))]);

    let plan = importer.plan(&source, &destination_sheet(&[])).unwrap();
    assert_eq!(plan.records[0].course_id.as_value(), Some(&12));
    assert_eq!(plan.records[0].grade_average.as_value(), Some(&89));
    assert!(plan.issues.is_empty());
}

#[test]
fn test_malformed_numbers_reject_aborts_before_mutation() {
    let importer = create_test_importer(ImportSettings {
        numeric_policy: NumericPolicy::Reject,
        ..ImportSettings::default()
    });
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Biology"),
        SourceRow::approved("Noah Garza", "S300", "History").course_no(CellValue::text("abc")),
    ]);
    let mut destination = destination_sheet(&[("BOB ADAMS", "S010", "GEOMETRY")]);
    let before = destination.clone();

    let err = importer
        .import_new_credits(&source, &mut destination)
        .unwrap_err();

    match err {
        ImportError::MalformedField { row, field, value } => {
            assert_eq!(row, 3);
            assert_eq!(field, "course_number");
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(destination, before);
}

// ==========================================
// 目标表已有重复键
// ==========================================

#[test]
fn test_preexisting_duplicates_reported_and_configurable() {
    let source = source_sheet(&[SourceRow::approved("Ana Ramos", "S050", "Algebra I")]);
    let destination = destination_sheet(&[
        ("BOB ADAMS", "S010", "GEOMETRY"),
        ("BOB ADAMS", "S010", "Geometry"),
    ]);

    let lenient = default_importer();
    let report = lenient.validate(&source, &destination).unwrap();
    assert_eq!(report.summary.warning, 1);
    assert_eq!(report.issues[0].kind, IssueKind::DuplicateKeyViolation);
    assert_eq!(report.issues[0].row_number, 3);

    let mut dest_copy = destination.clone();
    let summary = lenient.import_new_credits(&source, &mut dest_copy).unwrap();
    assert_eq!(summary.preexisting_duplicates, 1);
    assert_eq!(summary.inserted, 1);

    let strict = create_test_importer(ImportSettings {
        fail_on_preexisting_duplicates: true,
        ..ImportSettings::default()
    });
    let report = strict.validate(&source, &destination).unwrap();
    assert_eq!(report.issues[0].level, DqLevel::Error);

    let mut dest_copy = destination.clone();
    let err = strict.import_new_credits(&source, &mut dest_copy).unwrap_err();
    assert!(matches!(
        err,
        ImportError::DuplicateKeyViolation { row: 3, .. }
    ));
    assert_eq!(dest_copy, destination);
}

// ==========================================
// 列解析
// ==========================================

#[test]
fn test_missing_source_column_aborts() {
    let importer = default_importer();
    let mut source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Biology")]);
    source
        .write_range(1, 7, &[CellValue::text("Learner")])
        .unwrap();
    let mut destination = destination_sheet(&[]);

    let err = importer
        .import_new_credits(&source, &mut destination)
        .unwrap_err();
    assert!(matches!(err, ImportError::SchemaMismatch { .. }));
    assert!(err.is_resource_error());
}

#[test]
fn test_positional_resolution_ignores_headers() {
    let importer = create_test_importer(ImportSettings {
        column_resolution: ColumnResolution::Positional,
        ..ImportSettings::default()
    });
    let mut source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Biology")]);
    source
        .write_range(1, 1, &[CellValue::text("Check"), CellValue::text("When")])
        .unwrap();
    let mut destination = destination_sheet(&[]);

    let summary = importer
        .import_new_credits(&source, &mut destination)
        .unwrap();
    assert_eq!(summary.inserted, 1);
}

// ==========================================
// 文件导入
// ==========================================

#[test]
fn test_run_files_csv_fixtures() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let source_path = copy_fixture(dir.path(), "source_credits.csv");
    let destination_path = copy_fixture(dir.path(), "completed_credits.csv");
    let output_path = dir.path().join("updated_credits.csv");

    let importer = default_importer();
    let request = ImportRequest {
        source_path,
        destination_path: destination_path.clone(),
        output_path: Some(output_path.clone()),
        ..ImportRequest::default()
    };

    let summary = importer.run_files(&request).expect("Import should succeed");

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.unapproved, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.dq_report.summary.warning, 1);

    let written = UniversalFileParser
        .parse_sheet(&output_path, DESTINATION_SHEET)
        .unwrap();
    assert_eq!(column_texts(&written, 1), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(
        column_texts(&written, 3),
        vec!["S010", "S050", "S123", "S300", "S400"]
    );
    assert_eq!(
        column_texts(&written, 2),
        vec!["BOB ADAMS", "ANA RAMOS", "JANE DOE", "NOAH GARZA", "EVE ZABLOCKI"]
    );
    // 课程编号无法解析 → 错误标记
    assert_eq!(written.row(5).unwrap().cell(4).as_text(), "#NUM!");

    // 原目标文件未被修改
    let original = UniversalFileParser
        .parse_sheet(&destination_path, DESTINATION_SHEET)
        .unwrap();
    assert_eq!(original.last_row(), 3);

    // 以输出文件为目标再跑一次: 不再插入
    let rerun = ImportRequest {
        destination_path: output_path.clone(),
        output_path: None,
        ..request
    };
    let summary = importer.run_files(&rerun).unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.duplicates, 4);
}

#[test]
fn test_run_files_single_workbook() {
    let dir = tempdir().unwrap();
    let source = source_sheet(&[
        SourceRow::approved("Jane Doe", "S123", "Economics for CR"),
        SourceRow::unapproved("John Roe", "S200", "Biology"),
    ]);
    let destination = destination_sheet(&[("BOB ADAMS", "S010", "GEOMETRY")]);
    let workbook = write_workbook(dir.path(), "credits.xlsx", &[&source, &destination]);

    let importer = default_importer();
    let request = ImportRequest {
        source_path: workbook.clone(),
        destination_path: workbook.clone(),
        ..ImportRequest::default()
    };

    let summary = importer.run_files(&request).unwrap();
    assert_eq!(summary.inserted, 1);

    // 两张工作表都保留在工作簿中
    let written = UniversalFileParser
        .parse_sheet(&workbook, DESTINATION_SHEET)
        .unwrap();
    assert_eq!(column_texts(&written, 3), vec!["S010", "S123"]);
    assert_eq!(
        written.row(3).unwrap().cell(5),
        &CellValue::Date(date(2024, 1, 8))
    );
    let source_back = UniversalFileParser
        .parse_sheet(&workbook, SOURCE_SHEET)
        .unwrap();
    assert_eq!(source_back.last_row(), 3);

    let summary = importer.run_files(&request).unwrap();
    assert_eq!(summary.inserted, 0);
}

fn roster_sheet() -> credit_importer::Sheet {
    credit_importer::Sheet::from_rows(
        "Roster",
        vec![
            vec![CellValue::text("Student ID"), CellValue::text("Homeroom")],
            vec![CellValue::text("S123"), CellValue::Int(204)],
            vec![CellValue::Empty, CellValue::Empty],
            vec![CellValue::text("S200"), CellValue::Int(118)],
        ],
    )
}

fn sheet_names(path: &std::path::Path) -> Vec<String> {
    UniversalFileParser
        .parse_workbook(path)
        .unwrap()
        .iter()
        .map(|s| s.name().to_string())
        .collect()
}

#[test]
fn test_run_files_keeps_other_workbook_sheets() {
    let dir = tempdir().unwrap();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Economics for CR")]);
    let destination = destination_sheet(&[("BOB ADAMS", "S010", "GEOMETRY")]);
    let roster = roster_sheet();
    let workbook = write_workbook(
        dir.path(),
        "credits.xlsx",
        &[&source, &destination, &roster],
    );
    let names_before = sheet_names(&workbook);

    let importer = default_importer();
    let summary = importer
        .run_files(&ImportRequest {
            source_path: workbook.clone(),
            destination_path: workbook.clone(),
            ..ImportRequest::default()
        })
        .unwrap();
    assert_eq!(summary.inserted, 1);

    // 工作表顺序与名称不变
    assert_eq!(sheet_names(&workbook), names_before);

    // 未参与导入的工作表原样保留（含中间空行）
    let roster_back = UniversalFileParser
        .parse_workbook(&workbook)
        .unwrap()
        .into_iter()
        .find(|s| s.name() == "Roster")
        .unwrap();
    assert_eq!(roster_back.last_row(), 4);
    assert_eq!(roster_back.row(4).unwrap().cell(1), &CellValue::Int(118));

    let written = UniversalFileParser
        .parse_sheet(&workbook, DESTINATION_SHEET)
        .unwrap();
    assert_eq!(column_texts(&written, 3), vec!["S010", "S123"]);
}

#[test]
fn test_run_files_output_copy_keeps_workbook_sheets() {
    let dir = tempdir().unwrap();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Biology")]);
    let source_path = write_sheet(dir.path(), "source.csv", &source);
    let destination = destination_sheet(&[]);
    let roster = roster_sheet();
    let destination_path = write_workbook(dir.path(), "credits.xlsx", &[&roster, &destination]);
    let output_path = dir.path().join("credits-updated.xlsx");

    let importer = default_importer();
    importer
        .run_files(&ImportRequest {
            source_path,
            destination_path: destination_path.clone(),
            output_path: Some(output_path.clone()),
            ..ImportRequest::default()
        })
        .unwrap();

    assert_eq!(
        sheet_names(&output_path),
        vec!["Roster".to_string(), DESTINATION_SHEET.to_string()]
    );
    let written = UniversalFileParser
        .parse_sheet(&output_path, DESTINATION_SHEET)
        .unwrap();
    assert_eq!(column_texts(&written, 3), vec!["S123"]);
}

#[test]
fn test_run_files_missing_sheet_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Biology")]);
    let source_path = write_sheet(dir.path(), "source.csv", &source);
    let destination = destination_sheet(&[("BOB ADAMS", "S010", "GEOMETRY")]);
    let destination_path = write_workbook(dir.path(), "credits.xlsx", &[&destination]);
    let before = std::fs::read(&destination_path).unwrap();

    let importer = default_importer();
    let request = ImportRequest {
        source_path,
        destination_path: destination_path.clone(),
        destination_sheet: Some("Archived Credits".to_string()),
        ..ImportRequest::default()
    };

    let err = importer.run_files(&request).unwrap_err();
    assert!(matches!(err, ImportError::ResourceNotFound(_)));
    assert_eq!(std::fs::read(&destination_path).unwrap(), before);
}

#[test]
fn test_run_files_dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let source = source_sheet(&[SourceRow::approved("Jane Doe", "S123", "Biology")]);
    let source_path = write_sheet(dir.path(), "source.csv", &source);
    let destination_path = write_sheet(dir.path(), "credits.csv", &destination_sheet(&[]));
    let before = std::fs::read(&destination_path).unwrap();

    let importer = default_importer();
    let request = ImportRequest {
        source_path,
        destination_path: destination_path.clone(),
        dry_run: true,
        ..ImportRequest::default()
    };

    let summary = importer.run_files(&request).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.planned, 1);
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.notified, 0);
    assert_eq!(std::fs::read(&destination_path).unwrap(), before);
}

#[test]
fn test_validate_files() {
    let dir = tempdir().unwrap();
    let source_path = copy_fixture(dir.path(), "source_credits.csv");
    let destination_path = copy_fixture(dir.path(), "completed_credits.csv");

    let importer = create_test_importer(ImportSettings {
        numeric_policy: NumericPolicy::Reject,
        ..ImportSettings::default()
    });
    let report = importer
        .validate_files(&ImportRequest {
            source_path,
            destination_path,
            ..ImportRequest::default()
        })
        .unwrap();

    assert!(report.has_errors());
    assert_eq!(report.summary.error, 1);
    assert_eq!(report.issues[0].field, "course_number");
    assert_eq!(report.issues[0].row_number, 5);
}
