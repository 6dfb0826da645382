// ==========================================
// 课程学分导入工具 - 学分导入器实现
// ==========================================
// 职责: 整合导入流程，从源表到目标表
// 流程: 过滤 → 去重 → 转换 → 排序 → 插入 → 按学号排序并编号 → 通知
// ==========================================
// 目标表只在内存中修改，最后一次性写出；
// 任一步骤失败都不会留下部分写入的文件
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::credit::{
    DedupKey, DestinationRecord, DqReport, ExistingCredit, FieldIssue, ImportPlan, ImportSummary,
    SourceRecord,
};
use crate::domain::sheet::{Sheet, SheetRow};
use crate::domain::types::{compare_text_ci, BatchDedupPolicy, FieldOutcome};
use crate::importer::conflict_handler::ConflictHandler as ConflictHandlerImpl;
use crate::importer::credit_importer_trait::{
    ConflictHandler, CreditImporter, DataCleaner, DqValidator, FileParser, ImportRequest,
    SheetWriter,
};
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::dq_validator::DqValidator as DqValidatorImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{dest_cols, ColumnMap, FieldMapper};
use crate::importer::file_parser::{is_workbook_path, UniversalFileParser};
use crate::importer::sheet_writer::{sanitize_sheet_name, UniversalSheetWriter};
use crate::notify::{build_notifier, Notifier};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 新行插入起点（表头下方第一行）
const INSERT_START_ROW: usize = 2;

/// 新行写入起始列（B 列；A 列为序号）
const WRITE_START_COL: usize = 2;

// ==========================================
// CreditImporterImpl - 学分导入器实现
// ==========================================
pub struct CreditImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    sheet_writer: Box<dyn SheetWriter>,
    field_mapper: FieldMapper,
    data_cleaner: Box<dyn DataCleaner>,
    conflict_handler: Box<dyn ConflictHandler>,
    dq_validator: Box<dyn DqValidator>,

    // 通知
    notifier: Box<dyn Notifier>,
}

impl<C> CreditImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 创建新的 CreditImporter 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - sheet_writer: 工作表写出器
    /// - field_mapper: 字段映射器
    /// - data_cleaner: 数据清洗器
    /// - conflict_handler: 冲突处理器
    /// - dq_validator: DQ 校验器
    /// - notifier: 通知器
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: C,
        file_parser: Box<dyn FileParser>,
        sheet_writer: Box<dyn SheetWriter>,
        field_mapper: FieldMapper,
        data_cleaner: Box<dyn DataCleaner>,
        conflict_handler: Box<dyn ConflictHandler>,
        dq_validator: Box<dyn DqValidator>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            file_parser,
            sheet_writer,
            field_mapper,
            data_cleaner,
            conflict_handler,
            dq_validator,
            notifier,
        }
    }

    /// 按配置装配默认组件
    ///
    /// # 返回
    /// - Err(ConfigValueError): 通知器配置不完整
    pub fn from_config(config: C) -> ImportResult<Self> {
        let field_mapper = FieldMapper::new(config.get_column_resolution());
        let dq_validator = DqValidatorImpl::new(
            config.get_numeric_policy(),
            config.get_fail_on_preexisting_duplicates(),
        );
        let notifier = build_notifier(&config)?;

        Ok(Self::new(
            config,
            Box::new(UniversalFileParser),
            Box::new(UniversalSheetWriter),
            field_mapper,
            Box::new(DataCleanerImpl),
            Box::new(ConflictHandlerImpl),
            Box::new(dq_validator),
            notifier,
        ))
    }

    /// 替换通知器
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    // ==========================================
    // 步骤 1-4: 生成导入计划（不做 Error 级中止判断）
    // ==========================================
    fn build_plan(&self, source: &Sheet, destination: &Sheet) -> ImportResult<ImportPlan> {
        let run_id = Uuid::new_v4().to_string();
        let mut issues: Vec<FieldIssue> = Vec::new();

        // === 列解析（缺列即中止） ===
        let source_map = self.field_mapper.resolve_source(source)?;
        let dest_map = self.field_mapper.resolve_destination(destination)?;

        // === 目标表快照（运行开始时读取一次） ===
        let snapshot: Vec<ExistingCredit> = destination
            .body()
            .iter()
            .enumerate()
            .map(|(idx, row)| self.field_mapper.map_existing_row(&dest_map, row, idx + 2))
            .collect();

        let preexisting = self.conflict_handler.detect_preexisting_duplicates(&snapshot);
        if !preexisting.is_empty() {
            warn!(count = preexisting.len(), "目标表中已存在重复的学号与课程");
        }
        issues.extend(
            self.dq_validator
                .validate_preexisting(&preexisting, destination.name()),
        );
        debug!(snapshot_rows = snapshot.len(), "目标表快照完成");

        // === 步骤 1: 过滤已审批行 ===
        let total_rows = source.body().len();
        let mut unapproved = 0;
        let mut approved = Vec::new();
        for (idx, row) in source.body().iter().enumerate() {
            let record = self.map_source(&source_map, row, idx + 2);
            if record.approved {
                approved.push(record);
            } else {
                unapproved += 1;
            }
        }
        debug!(total_rows, approved = approved.len(), unapproved, "步骤 1: 审批过滤完成");

        // === 步骤 2: 与快照去重 ===
        let mut duplicates = 0;
        let mut candidates = Vec::new();
        for record in approved {
            let key = record.dedup_key();
            if self.conflict_handler.is_snapshot_duplicate(&key, &snapshot) {
                debug!(row = record.row_number, key = %key, "与目标表重复，跳过");
                duplicates += 1;
            } else {
                candidates.push(record);
            }
        }

        // 批内去重（可配置）
        let mut batch_duplicates = 0;
        if self.config.get_batch_dedup_policy() == BatchDedupPolicy::SnapshotAndBatch {
            let keys: Vec<(usize, DedupKey)> = candidates
                .iter()
                .map(|r| (r.row_number, r.dedup_key()))
                .collect();
            let dropped: HashSet<usize> = self
                .conflict_handler
                .detect_batch_duplicates(&keys)
                .into_iter()
                .collect();
            batch_duplicates = dropped.len();
            candidates.retain(|r| !dropped.contains(&r.row_number));
        }
        debug!(
            duplicates,
            batch_duplicates,
            remaining = candidates.len(),
            "步骤 2: 去重完成"
        );

        // === 步骤 3: 转换 ===
        let mut records = Vec::with_capacity(candidates.len());
        for source_record in &candidates {
            issues.extend(self.dq_validator.validate_source(source_record, source.name()));

            // 课程编号为空同样视为格式错误（空串无法解析为整数）
            let course_id = match self.data_cleaner.parse_integer(&source_record.course_number) {
                FieldOutcome::Blank => FieldOutcome::Malformed { raw: String::new() },
                outcome => outcome,
            };

            let record = DestinationRecord {
                index: None,
                student_name: self.data_cleaner.clean_text(&source_record.student_name, true),
                student_id: source_record.student_id.clone(),
                course_name: self.data_cleaner.clean_text(&source_record.course_name, true),
                course_id,
                course_start_date: source_record.course_start_date.clone(),
                credit_date: source_record.course_end_date.clone(),
                grade_average: self.data_cleaner.parse_integer(&source_record.course_grade),
                teacher_of_record: source_record.teacher_of_record.clone(),
                hours_on_course: source_record.hours_on_course.clone(),
                reference_url: source_record.reference_url.clone(),
                local_school: String::new(),
                notes: String::new(),
                source_row: source_record.row_number,
            };

            issues.extend(self.dq_validator.validate_record(&record, source.name()));
            records.push(record);
        }

        // === 步骤 4: 按姓名排序（不区分大小写，稳定） ===
        records.sort_by(|a, b| compare_text_ci(&a.student_name, &b.student_name));
        debug!(records = records.len(), issues = issues.len(), "步骤 3-4: 转换与排序完成");

        Ok(ImportPlan {
            run_id,
            total_rows,
            unapproved,
            duplicates,
            batch_duplicates,
            preexisting_duplicates: preexisting.len(),
            records,
            issues,
        })
    }

    fn map_source(&self, map: &ColumnMap, row: &SheetRow, row_number: usize) -> SourceRecord {
        self.field_mapper
            .map_source_row(map, row, row_number, |cell| self.data_cleaner.is_approved(cell))
    }

    /// 读取源表与目标表（工作表名: 请求 → 配置）
    fn read_sheets(&self, request: &ImportRequest) -> ImportResult<(Sheet, Sheet)> {
        let source_sheet = request
            .source_sheet
            .clone()
            .unwrap_or_else(|| self.config.get_source_sheet());
        let destination_sheet = request
            .destination_sheet
            .clone()
            .unwrap_or_else(|| self.config.get_destination_sheet());

        let source = self
            .file_parser
            .parse_sheet(&request.source_path, &source_sheet)?;
        let destination = self
            .file_parser
            .parse_sheet(&request.destination_path, &destination_sheet)?;
        info!(
            source_rows = source.body().len(),
            destination_rows = destination.body().len(),
            "工作表读取完成"
        );
        Ok((source, destination))
    }

    /// 组装写出的工作表
    ///
    /// 工作簿 → 工作簿: 读取目标文件中的全部工作表，按原顺序写回，
    /// 其中目标表替换为导入后的内容（同一工作簿时源表也在其中）。
    /// 其他情况只写出目标表
    fn output_sheets(
        &self,
        request: &ImportRequest,
        output: &Path,
        destination: Sheet,
    ) -> ImportResult<Vec<Sheet>> {
        if !is_workbook_path(&request.destination_path) || is_csv_path(output) {
            return Ok(vec![destination]);
        }

        let mut sheets = self.file_parser.parse_workbook(&request.destination_path)?;
        let wanted = destination.name().to_string();
        let sanitized = sanitize_sheet_name(&wanted);
        let position = sheets
            .iter()
            .position(|s| s.name() == wanted)
            .or_else(|| sheets.iter().position(|s| s.name() == sanitized))
            .ok_or_else(|| {
                ImportError::ResourceNotFound(format!("工作表不存在: {}", wanted))
            })?;

        let actual_name = sheets[position].name().to_string();
        sheets[position] = destination.with_name(actual_name);
        debug!(
            kept = sheets.len() - 1,
            "目标工作簿中的其他工作表一并写回（仅保留单元格值）"
        );
        Ok(sheets)
    }

    /// 逐条通知；失败只记录并计数
    fn notify_all(&self, records: &[DestinationRecord]) -> (usize, usize) {
        let mut notified = 0;
        let mut failures = 0;
        for record in records {
            match self.notifier.notify(&record.student_name, &record.course_name) {
                Ok(()) => notified += 1,
                Err(e) => {
                    warn!(
                        student_name = %record.student_name,
                        course_name = %record.course_name,
                        error = %e,
                        "通知失败"
                    );
                    failures += 1;
                }
            }
        }
        (notified, failures)
    }

    #[allow(clippy::too_many_arguments)]
    fn summarize(
        &self,
        plan: &ImportPlan,
        dry_run: bool,
        inserted: usize,
        notified: usize,
        notify_failures: usize,
        started_at: DateTime<Utc>,
    ) -> ImportSummary {
        let dq_report = self
            .dq_validator
            .generate_dq_report(plan.run_id.clone(), plan.issues.clone());

        ImportSummary {
            run_id: plan.run_id.clone(),
            dry_run,
            total_rows: plan.total_rows,
            unapproved: plan.unapproved,
            duplicates: plan.duplicates,
            batch_duplicates: plan.batch_duplicates,
            preexisting_duplicates: plan.preexisting_duplicates,
            planned: plan.records.len(),
            inserted,
            notified,
            notify_failures,
            dq_report,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl<C> CreditImporter for CreditImporterImpl<C>
where
    C: ImportConfigReader,
{
    #[instrument(skip_all, fields(source = source.name(), destination = destination.name()))]
    fn plan(&self, source: &Sheet, destination: &Sheet) -> ImportResult<ImportPlan> {
        let plan = self.build_plan(source, destination)?;
        self.dq_validator.enforce(&plan.issues)?;

        info!(
            run_id = %plan.run_id,
            total_rows = plan.total_rows,
            unapproved = plan.unapproved,
            duplicates = plan.duplicates,
            planned = plan.records.len(),
            "导入计划生成完成"
        );
        Ok(plan)
    }

    #[instrument(skip_all, fields(run_id = %plan.run_id, records = plan.records.len()))]
    fn apply(&self, plan: &ImportPlan, destination: &mut Sheet) -> ImportResult<usize> {
        // 空目标表先补表头
        if destination.is_empty() {
            destination.push_row(SheetRow::new(self.field_mapper.default_destination_header()));
            debug!("目标表为空，已写入默认表头");
        }

        // === 步骤 5: 逐条插入 ===
        let mut cursor = INSERT_START_ROW;
        for record in &plan.records {
            destination.insert_row_before(cursor)?;
            destination.write_range(cursor, WRITE_START_COL, &record.to_cells())?;
            destination.clear_background(cursor)?;
            destination.set_border(cursor, true)?;
            cursor += 1;
        }

        // === 步骤 6: 按学号排序 + 重新编号 ===
        destination.sort_body_by_column(dest_cols::STUDENT_ID)?;
        destination.renumber_column(dest_cols::INDEX)?;

        info!(
            inserted = plan.records.len(),
            total = destination.body().len(),
            "目标表更新完成"
        );
        Ok(plan.records.len())
    }

    fn import_new_credits(
        &self,
        source: &Sheet,
        destination: &mut Sheet,
    ) -> ImportResult<ImportSummary> {
        let started_at = Utc::now();

        let plan = self.plan(source, destination)?;
        let inserted = self.apply(&plan, destination)?;

        // === 步骤 7: 通知 ===
        let (notified, failures) = self.notify_all(&plan.records);

        Ok(self.summarize(&plan, false, inserted, notified, failures, started_at))
    }

    #[instrument(skip_all, fields(source = source.name(), destination = destination.name()))]
    fn validate(&self, source: &Sheet, destination: &Sheet) -> ImportResult<DqReport> {
        let plan = self.build_plan(source, destination)?;
        let report = self
            .dq_validator
            .generate_dq_report(plan.run_id, plan.issues);

        info!(
            info = report.summary.info,
            warning = report.summary.warning,
            error = report.summary.error,
            "校验完成"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(
        source = %request.source_path.display(),
        destination = %request.destination_path.display(),
        dry_run = request.dry_run,
    ))]
    fn run_files(&self, request: &ImportRequest) -> ImportResult<ImportSummary> {
        let started_at = Utc::now();

        // 任一工作表缺失即中止，此时尚未修改任何内容
        let (source, mut destination) = self.read_sheets(request)?;

        let plan = self.plan(&source, &destination)?;

        if request.dry_run {
            info!(planned = plan.records.len(), "dry-run: 不写出、不通知");
            return Ok(self.summarize(&plan, true, 0, 0, 0, started_at));
        }

        let inserted = self.apply(&plan, &mut destination)?;

        // === 写出（目标工作簿中的其他工作表原样写回） ===
        let output = request
            .output_path
            .clone()
            .unwrap_or_else(|| request.destination_path.clone());
        let sheets = self.output_sheets(request, &output, destination)?;
        let sheet_refs: Vec<&Sheet> = sheets.iter().collect();
        self.sheet_writer.write_sheets(&sheet_refs, &output)?;
        info!(path = %output.display(), sheets = sheets.len(), "目标表已写出");

        // === 步骤 7: 通知 ===
        let (notified, failures) = self.notify_all(&plan.records);

        let summary = self.summarize(&plan, false, inserted, notified, failures, started_at);
        info!(
            run_id = %summary.run_id,
            inserted = summary.inserted,
            notified = summary.notified,
            notify_failures = summary.notify_failures,
            "导入完成"
        );
        Ok(summary)
    }

    fn validate_files(&self, request: &ImportRequest) -> ImportResult<DqReport> {
        let (source, destination) = self.read_sheets(request)?;
        self.validate(&source, &destination)
    }
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
