//! PDF report renderer.
//!
//! Rendering happens in two steps. [`layout_report`] flows a
//! [`ReportRequest`] onto A4 pages as a list of drawing operations, breaking
//! pages when vertical space runs out. [`render_pdf`] turns that layout into
//! PDF bytes with `lopdf`, using the standard Helvetica faces.
//!
//! Calculation reports print each field under a fixed Portuguese label.
//! The label set is injective per report kind, so [`recover_payload`] can
//! read the field values back out of a layout.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use serde_json::{Map, Value};

use crate::error::SstError;
use crate::models::{ReportKind, ReportRequest, SesmtRole, TrainingTier};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const MARGIN: f32 = 30.0;
const BOTTOM_MARGIN: f32 = 50.0;
const HEADER_HEIGHT: f32 = 80.0;
const CONTINUATION_TOP: f32 = PAGE_HEIGHT - 50.0;
const LINE: f32 = 15.0;
const ITEM_GAP: f32 = 5.0;
const VALUE_X: f32 = 190.0;
const SUBLIST_X: f32 = 40.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

pub const HEADER_BLUE: Color = Color(0.0, 0.2, 0.4); // #003366
pub const TRACE_BLUE: Color = Color(0.0, 0.2, 0.55);
pub const WHITE: Color = Color(1.0, 1.0, 1.0);
pub const BLACK: Color = Color(0.0, 0.0, 0.0);
pub const GREEN: Color = Color(0.0, 0.5, 0.0);
pub const RED: Color = Color(0.8, 0.0, 0.0);
pub const GREY: Color = Color(0.5, 0.5, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Italic];

    fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
        }
    }

    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Color,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Dot {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
    /// "Página i de n", filled in once the page count is known.
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    /// Every text run in reading order, footers excluded.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| {
            p.ops.iter().filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
        })
    }
}

/// Audit status of a checklist question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistStatus {
    Conforming,
    NonConforming,
    NotApplicable,
}

impl ChecklistStatus {
    /// Accepts English and Portuguese spellings, case- and accent-insensitive.
    pub fn parse(raw: &str) -> Option<ChecklistStatus> {
        let folded: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'ã' | 'á' | 'â' | 'à' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                '_' | '-' => ' ',
                c => c,
            })
            .collect();
        let folded = folded.split_whitespace().collect::<Vec<_>>().join(" ");

        match folded.as_str() {
            "conforming" | "conforme" | "compliant" | "c" => Some(ChecklistStatus::Conforming),
            "non conforming" | "nonconforming" | "nao conforme" | "non compliant" | "nc" => {
                Some(ChecklistStatus::NonConforming)
            }
            "not applicable" | "n/a" | "na" | "nao aplicavel" => {
                Some(ChecklistStatus::NotApplicable)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChecklistStatus::Conforming => "Conforme",
            ChecklistStatus::NonConforming => "Não Conforme",
            ChecklistStatus::NotApplicable => "N/A",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ChecklistStatus::Conforming => GREEN,
            ChecklistStatus::NonConforming => RED,
            ChecklistStatus::NotApplicable => GREY,
        }
    }
}

const OBSERVATION_KEYS: [&str; 3] = ["observations", "observacoes", "observações"];

const TRACE_FIELD: &str = "computationTrace";
const ROLE_FIELD: &str = "roleCounts";
const TIER_FIELD: &str = "trainingTier";

const BRIGADE_FIELDS: &[(&str, &str)] = &[
    ("classificationLabel", "Classificação"),
    ("resolvedDivision", "Divisão aplicada"),
    ("fallbackApplied", "Regra padrão aplicada"),
    ("requiredCount", "Brigadistas necessários"),
    ("trainingTier", "Nível de treinamento"),
    ("computationTrace", "Memória de cálculo"),
];

const CIPA_FIELDS: &[(&str, &str)] = &[
    ("riskGrade", "Grau de risco"),
    ("effectiveMembers", "Membros efetivos"),
    ("alternateMembers", "Membros suplentes"),
    ("designatedOnly", "Apenas designado"),
    ("computationTrace", "Memória de cálculo"),
];

const SESMT_FIELDS: &[(&str, &str)] = &[
    ("riskGrade", "Grau de risco"),
    ("roleCounts", "Equipe SESMT"),
    ("computationTrace", "Memória de cálculo"),
];

fn field_table(kind: ReportKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ReportKind::Brigade => BRIGADE_FIELDS,
        ReportKind::Cipa => CIPA_FIELDS,
        ReportKind::Sesmt => SESMT_FIELDS,
        ReportKind::Checklist => &[],
    }
}

fn label_for(kind: ReportKind, key: &str) -> String {
    field_table(kind)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| key.to_string())
}

fn key_for(kind: ReportKind, label: &str) -> String {
    field_table(kind)
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(key, _)| key.to_string())
        .unwrap_or_else(|| label.to_string())
}

const METADATA_LABELS: [(&str, &str, &str); 4] = [
    ("client", "cliente", "Cliente"),
    ("project", "projeto", "Projeto"),
    ("auditor", "auditor", "Auditor"),
    ("sector", "setor", "Setor"),
];

/// Flow layout cursor over a growing list of pages.
struct Writer {
    done: Vec<Page>,
    current: Page,
    y: f32,
}

impl Writer {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Page::default(),
            y: CONTINUATION_TOP,
        }
    }

    fn push(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = CONTINUATION_TOP;
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < BOTTOM_MARGIN {
            self.new_page();
        }
    }

    fn text_at(&mut self, x: f32, font: Font, size: f32, color: Color, text: impl Into<String>) {
        self.push(DrawOp::Text {
            x,
            y: self.y,
            size,
            font,
            color,
            text: text.into(),
        });
    }

    fn line(&mut self, x: f32, font: Font, color: Color, text: impl Into<String>) {
        self.ensure(LINE);
        self.text_at(x, font, BODY_SIZE, color, text);
        self.y -= LINE;
    }

    fn paragraph(&mut self, x: f32, font: Font, color: Color, text: &str) {
        for line in wrap(text, font, BODY_SIZE, PAGE_WIDTH - MARGIN - x) {
            self.line(x, font, color, line);
        }
    }

    fn finish(mut self) -> Layout {
        self.done.push(self.current);
        let total = self.done.len();
        for (i, page) in self.done.iter_mut().enumerate() {
            page.footer = format!("Página {} de {}", i + 1, total);
        }
        Layout { pages: self.done }
    }
}

/// Lay out a report. `generated_on` is printed in the header.
pub fn layout_report(request: &ReportRequest, generated_on: NaiveDate) -> Result<Layout, SstError> {
    let mut w = Writer::new();
    header(&mut w, request, generated_on);

    match request.kind {
        ReportKind::Checklist => checklist_body(&mut w, &request.payload)?,
        kind => calculation_body(&mut w, kind, &request.payload),
    }

    Ok(w.finish())
}

/// Lay out and encode a report as PDF bytes.
pub fn render_report(request: &ReportRequest, generated_on: NaiveDate) -> Result<Vec<u8>, SstError> {
    let layout = layout_report(request, generated_on)?;
    render_pdf(&layout)
}

fn header(w: &mut Writer, request: &ReportRequest, generated_on: NaiveDate) {
    w.push(DrawOp::Rect {
        x: 0.0,
        y: PAGE_HEIGHT - HEADER_HEIGHT,
        width: PAGE_WIDTH,
        height: HEADER_HEIGHT,
        color: HEADER_BLUE,
    });
    w.y = PAGE_HEIGHT - 50.0;
    w.text_at(
        MARGIN,
        Font::Bold,
        16.0,
        WHITE,
        format!(
            "RELATÓRIO TÉCNICO: {}",
            request.kind.as_str().to_uppercase()
        ),
    );
    w.y = PAGE_HEIGHT - 110.0;

    let mut printed: Vec<&str> = Vec::new();
    for (en, pt, label) in METADATA_LABELS {
        for key in [en, pt] {
            if let Some(value) = request.metadata.get(key) {
                w.paragraph(
                    MARGIN,
                    Font::Regular,
                    BLACK,
                    &format!("{}: {}", label, value_text(value)),
                );
                printed.push(key);
                break;
            }
        }
    }
    for (key, value) in &request.metadata {
        if !printed.contains(&key.as_str()) {
            w.paragraph(
                MARGIN,
                Font::Regular,
                BLACK,
                &format!("{}: {}", key, value_text(value)),
            );
        }
    }
    w.line(
        MARGIN,
        Font::Regular,
        BLACK,
        format!("Data de emissão: {}", generated_on.format("%d/%m/%Y")),
    );

    w.y -= 10.0;
    w.push(DrawOp::Line {
        x1: MARGIN,
        y1: w.y,
        x2: PAGE_WIDTH - MARGIN,
        y2: w.y,
    });
    w.y -= 25.0;
}

fn checklist_body(w: &mut Writer, payload: &Map<String, Value>) -> Result<(), SstError> {
    let mut counts = [0usize; 3];
    let mut observations: Option<String> = None;

    for (question, value) in payload {
        if OBSERVATION_KEYS.contains(&question.as_str()) {
            observations = Some(value_text(value));
            continue;
        }
        let raw = value.as_str().ok_or_else(|| {
            SstError::invalid(format!("status for '{}' must be a string", question))
        })?;
        let status = ChecklistStatus::parse(raw).ok_or_else(|| {
            SstError::invalid(format!(
                "unrecognised status '{}' for '{}'; expected Conforme, Não Conforme or N/A",
                raw, question
            ))
        })?;
        counts[status as usize] += 1;

        let lines = wrap(
            &format!("{}: {}", question, status.label()),
            Font::Regular,
            BODY_SIZE,
            PAGE_WIDTH - 2.0 * MARGIN,
        );
        w.ensure(LINE);
        w.push(DrawOp::Dot {
            cx: 20.0,
            cy: w.y + 3.0,
            radius: 3.0,
            color: status.color(),
        });
        for line in lines {
            w.line(MARGIN, Font::Regular, BLACK, line);
        }
        w.y -= ITEM_GAP;
    }

    if counts.iter().sum::<usize>() == 0 {
        w.line(MARGIN, Font::Regular, GREY, "Nenhum item avaliado.");
    } else {
        w.y -= ITEM_GAP;
        w.line(
            MARGIN,
            Font::Bold,
            BLACK,
            format!(
                "Resumo: {} conforme(s), {} não conforme(s), {} N/A",
                counts[0], counts[1], counts[2]
            ),
        );
    }

    if let Some(text) = observations.filter(|t| !t.trim().is_empty()) {
        w.y -= ITEM_GAP * 2.0;
        w.line(MARGIN, Font::Bold, BLACK, "Observações:");
        w.paragraph(MARGIN, Font::Regular, BLACK, &text);
    }

    Ok(())
}

fn calculation_body(w: &mut Writer, kind: ReportKind, payload: &Map<String, Value>) {
    let table = field_table(kind);
    let mut fields: Vec<(&str, &Value)> = table
        .iter()
        .filter_map(|(key, _)| payload.get(*key).map(|v| (*key, v)))
        .collect();
    fields.extend(
        payload
            .iter()
            .filter(|(key, _)| !table.iter().any(|(k, _)| k == key))
            .map(|(k, v)| (k.as_str(), v)),
    );

    for (key, value) in fields {
        let label = format!("{}:", label_for(kind, key));
        match (key, value) {
            (TRACE_FIELD, _) => {
                w.line(MARGIN, Font::Bold, BLACK, label);
                w.paragraph(MARGIN, Font::Italic, TRACE_BLUE, &value_text(value));
            }
            (_, Value::Object(entries)) => {
                w.line(MARGIN, Font::Bold, BLACK, label);
                let listed: Vec<String> = entries
                    .iter()
                    .filter(|(_, v)| key != ROLE_FIELD || v.as_u64() != Some(0))
                    .map(|(k, v)| {
                        let name = SesmtRole::from_key(k)
                            .map(|r| r.label().to_string())
                            .unwrap_or_else(|| k.clone());
                        format!("- {}: {}", name, value_text(v))
                    })
                    .collect();
                if listed.is_empty() {
                    let none = if key == ROLE_FIELD {
                        "- Nenhum profissional exigido"
                    } else {
                        "-"
                    };
                    w.line(SUBLIST_X, Font::Regular, BLACK, none);
                }
                for item in listed {
                    w.paragraph(SUBLIST_X, Font::Regular, BLACK, &item);
                }
            }
            _ => {
                let text = if key == TIER_FIELD {
                    serde_json::from_value::<TrainingTier>(value.clone())
                        .map(|t| t.label().to_string())
                        .unwrap_or_else(|_| value_text(value))
                } else {
                    value_text(value)
                };
                let lines = wrap(&text, Font::Regular, BODY_SIZE, PAGE_WIDTH - MARGIN - VALUE_X);
                w.ensure(LINE);
                w.text_at(MARGIN, Font::Bold, BODY_SIZE, BLACK, label);
                for (i, line) in lines.into_iter().enumerate() {
                    if i > 0 {
                        w.ensure(LINE);
                    }
                    w.text_at(VALUE_X, Font::Regular, BODY_SIZE, BLACK, line);
                    w.y -= LINE;
                }
            }
        }
        w.y -= ITEM_GAP;
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Sim".to_string(),
        Value::Bool(false) => "Não".to_string(),
        Value::Null => "-".to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn value_from_text(text: &str) -> Value {
    match text {
        "Sim" => Value::Bool(true),
        "Não" => Value::Bool(false),
        _ => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
    }
}

/// Read the payload of a calculation report back out of its layout.
///
/// Bold runs ending in `:` open a field; the runs that follow are its
/// value. Zero role counts are not printed, so they do not come back.
pub fn recover_payload(kind: ReportKind, layout: &Layout) -> Map<String, Value> {
    enum Field {
        Scalar(String, Vec<String>),
        Nested(String, Map<String, Value>),
    }

    fn close(field: Option<Field>, out: &mut Map<String, Value>) {
        match field {
            Some(Field::Scalar(key, parts)) => {
                let text = parts.join(" ");
                let value = if key == TRACE_FIELD {
                    Value::String(text)
                } else if key == TIER_FIELD {
                    TrainingTier::from_label(&text)
                        .and_then(|t| serde_json::to_value(t).ok())
                        .unwrap_or(Value::String(text))
                } else {
                    value_from_text(&text)
                };
                out.insert(key, value);
            }
            Some(Field::Nested(key, map)) => {
                out.insert(key, Value::Object(map));
            }
            None => {}
        }
    }

    let mut out = Map::new();
    let mut open: Option<Field> = None;
    let mut in_body = false;

    for page in &layout.pages {
        for op in &page.ops {
            let (x, font, text) = match op {
                DrawOp::Line { .. } => {
                    in_body = true;
                    continue;
                }
                DrawOp::Text { x, font, text, .. } if in_body => (*x, *font, text.as_str()),
                _ => continue,
            };

            if font == Font::Bold && text.ends_with(':') {
                close(open.take(), &mut out);
                let key = key_for(kind, text.trim_end_matches(':'));
                open = Some(if key == ROLE_FIELD {
                    Field::Nested(key, Map::new())
                } else {
                    Field::Scalar(key, Vec::new())
                });
                continue;
            }

            // Sub-list items sit at SUBLIST_X; scalar values at VALUE_X or
            // MARGIN may themselves start with "- ".
            let starts_list = x == SUBLIST_X
                && matches!(&open, Some(Field::Scalar(_, parts)) if parts.is_empty());
            if starts_list {
                if let Some(Field::Scalar(key, _)) = open.take() {
                    open = Some(Field::Nested(key, Map::new()));
                }
            }

            match open.as_mut() {
                Some(Field::Scalar(_, parts)) => parts.push(text.to_string()),
                Some(Field::Nested(_, map)) => {
                    if let Some(item) = text.strip_prefix("- ") {
                        insert_list_item(map, item);
                    }
                }
                None => {}
            }
        }
    }
    close(open, &mut out);
    out
}

fn insert_list_item(map: &mut Map<String, Value>, item: &str) {
    if let Some((name, value)) = item.rsplit_once(": ") {
        let key = SesmtRole::from_label(name)
            .map(|r| r.key().to_string())
            .unwrap_or_else(|| name.to_string());
        map.insert(key, value_from_text(value));
    }
}

/// Approximate advance width of `text`, in points.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 0.25,
            ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '/' | '-' => 0.33,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.85,
            c if c.is_uppercase() => 0.68,
            _ => 0.55,
        })
        .sum();
    let weight = if font == Font::Bold { 1.05 } else { 1.0 };
    em * size * weight
}

/// Greedy word wrap. Words wider than the line are split by character.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && text_width(&current, font, size) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for a WinAnsiEncoding font. Characters outside the code
/// page are approximated or replaced by `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20}'..='\u{7e}' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            '€' => out.push(0x80),
            '‚' => out.push(0x82),
            '„' => out.push(0x84),
            '…' => out.push(0x85),
            '‘' => out.push(0x91),
            '’' => out.push(0x92),
            '“' => out.push(0x93),
            '”' => out.push(0x94),
            '•' => out.push(0x95),
            '–' => out.push(0x96),
            '—' => out.push(0x97),
            '≤' => out.extend_from_slice(b"<="),
            '≥' => out.extend_from_slice(b">="),
            _ => out.push(b'?'),
        }
    }
    out
}

fn rendering(e: lopdf::Error) -> SstError {
    SstError::Rendering(e.to_string())
}

fn fill(color: Color) -> Operation {
    Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()])
}

fn text_ops(font: Font, size: f32, x: f32, y: f32, color: Color, text: &str) -> Vec<Operation> {
    vec![
        fill(color),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font.resource().as_bytes().to_vec()), size.into()],
        ),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn dot_ops(cx: f32, cy: f32, r: f32, color: Color) -> Vec<Operation> {
    // Four cubic Béziers approximating a circle.
    let k = 0.5523 * r;
    let curve = |pts: [f32; 6]| Operation::new("c", pts.iter().map(|v| (*v).into()).collect());
    vec![
        fill(color),
        Operation::new("m", vec![(cx + r).into(), cy.into()]),
        curve([cx + r, cy + k, cx + k, cy + r, cx, cy + r]),
        curve([cx - k, cy + r, cx - r, cy + k, cx - r, cy]),
        curve([cx - r, cy - k, cx - k, cy - r, cx, cy - r]),
        curve([cx + k, cy - r, cx + r, cy - k, cx + r, cy]),
        Operation::new("f", vec![]),
    ]
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                font,
                color,
                text,
            } => ops.extend(text_ops(*font, *size, *x, *y, *color, text)),
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                ops.push(fill(*color));
                ops.push(Operation::new(
                    "re",
                    vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::Dot {
                cx,
                cy,
                radius,
                color,
            } => ops.extend(dot_ops(*cx, *cy, *radius, *color)),
            DrawOp::Line { x1, y1, x2, y2 } => {
                ops.push(Operation::new("RG", vec![0.into(), 0.into(), 0.into()]));
                ops.push(Operation::new("w", vec![0.5f32.into()]));
                ops.push(Operation::new("m", vec![(*x1).into(), (*y1).into()]));
                ops.push(Operation::new("l", vec![(*x2).into(), (*y2).into()]));
                ops.push(Operation::new("S", vec![]));
            }
        }
    }
    if !page.footer.is_empty() {
        let width = text_width(&page.footer, Font::Regular, FOOTER_SIZE);
        ops.extend(text_ops(
            Font::Regular,
            FOOTER_SIZE,
            (PAGE_WIDTH - width) / 2.0,
            25.0,
            GREY,
            &page.footer,
        ));
    }
    ops
}

/// Encode a layout as a PDF document.
pub fn render_pdf(layout: &Layout) -> Result<Vec<u8>, SstError> {
    if layout.pages.is_empty() {
        return Err(SstError::Rendering("layout has no pages".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in Font::ALL {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(rendering)?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| SstError::Rendering(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;
    use crate::models::CalculationResult;
    use crate::sizing::{size_brigade, size_cipa, size_sesmt, RiskClassifier};
    use crate::tables::TableStore;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn request(kind: ReportKind, metadata: Value, payload: Value) -> ReportRequest {
        ReportRequest {
            kind,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            payload: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    fn texts(layout: &Layout) -> Vec<String> {
        layout.texts().map(str::to_string).collect()
    }

    #[test]
    fn header_has_title_metadata_and_date() {
        let req = request(
            ReportKind::Cipa,
            json!({"sector": "Obra", "extra": "x", "client": "ACME"}),
            json!({}),
        );
        let layout = layout_report(&req, date()).unwrap();
        let t = texts(&layout);
        assert_eq!(t[0], "RELATÓRIO TÉCNICO: CIPA");
        assert_eq!(t[1], "Cliente: ACME");
        assert_eq!(t[2], "Setor: Obra");
        assert_eq!(t[3], "extra: x");
        assert_eq!(t[4], "Data de emissão: 15/03/2024");
        assert!(matches!(
            layout.pages[0].ops[0],
            DrawOp::Rect { color, .. } if color == HEADER_BLUE
        ));
    }

    #[test]
    fn checklist_line_has_conforming_marker() {
        let req = request(ReportKind::Checklist, json!({}), json!({"Q1": "Conforming"}));
        let layout = layout_report(&req, date()).unwrap();
        let ops = &layout.pages[0].ops;

        let q1: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, DrawOp::Text { text, .. } if text.contains("Q1")))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(q1.len(), 1);
        assert!(matches!(ops[q1[0]], DrawOp::Text { ref text, .. } if text == "Q1: Conforme"));
        assert!(matches!(ops[q1[0] - 1], DrawOp::Dot { color, .. } if color == GREEN));
    }

    #[test]
    fn checklist_statuses_in_both_languages() {
        let req = request(
            ReportKind::Checklist,
            json!({}),
            json!({
                "A": "Conforme",
                "B": "Não Conforme",
                "C": "N/A",
                "D": "non-conforming",
                "observacoes": "Extintor vencido no galpão 2."
            }),
        );
        let layout = layout_report(&req, date()).unwrap();
        let dots: Vec<Color> = layout.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Dot { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(dots, vec![GREEN, RED, GREY, RED]);

        let t = texts(&layout);
        assert!(t.contains(&"Resumo: 1 conforme(s), 2 não conforme(s), 1 N/A".to_string()));
        let obs = t.iter().position(|s| s == "Observações:").unwrap();
        assert_eq!(t[obs + 1], "Extintor vencido no galpão 2.");
        assert_eq!(obs, t.len() - 2);
    }

    #[test]
    fn unknown_status_is_invalid_input() {
        let req = request(ReportKind::Checklist, json!({}), json!({"Q1": "talvez"}));
        assert!(matches!(
            layout_report(&req, date()),
            Err(SstError::InvalidInput(_))
        ));
        let req = request(ReportKind::Checklist, json!({}), json!({"Q1": 3}));
        assert!(matches!(
            render_report(&req, date()),
            Err(SstError::InvalidInput(_))
        ));
    }

    #[test]
    fn long_checklist_paginates_with_footers() {
        let mut payload = Map::new();
        for i in 0..120 {
            payload.insert(format!("Questão {}", i), json!("Conforme"));
        }
        let req = ReportRequest {
            kind: ReportKind::Checklist,
            metadata: Map::new(),
            payload,
        };
        let layout = layout_report(&req, date()).unwrap();
        assert!(layout.pages.len() >= 3);
        let n = layout.pages.len();
        for (i, page) in layout.pages.iter().enumerate() {
            assert_eq!(page.footer, format!("Página {} de {}", i + 1, n));
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= BOTTOM_MARGIN, "text below margin: {}", y);
                }
            }
        }
        // Every question appears exactly once, in order.
        let questions: Vec<String> = layout
            .texts()
            .filter(|t| t.starts_with("Questão"))
            .map(str::to_string)
            .collect();
        assert_eq!(questions.len(), 120);
        assert_eq!(questions[119], "Questão 119: Conforme");
    }

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        let text = "Base (8) + 7% sobre excedente de 10 (40 pessoas = 3) = Total 11.";
        let lines = wrap(text, Font::Italic, 10.0, 120.0);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(text_width(l, Font::Italic, 10.0) <= 120.0 || !l.contains(' '));
        }
        assert_eq!(lines.join(" "), text);
        assert_eq!(wrap("", Font::Regular, 10.0, 100.0), vec![String::new()]);
    }

    #[test]
    fn overlong_word_is_split() {
        let word = "x".repeat(200);
        let lines = wrap(&word, Font::Regular, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn trace_renders_italic_blue() {
        let tables = TableStore::standard().unwrap();
        let result = CalculationResult::Brigade(size_brigade(&tables, 50, "I-2").unwrap());
        let req = ReportRequest::from_result(&result, Map::new());
        let layout = layout_report(&req, date()).unwrap();
        let trace = layout.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Text {
                font: Font::Italic,
                color,
                text,
                ..
            } => Some((*color, text.clone())),
            _ => None,
        });
        let (color, text) = trace.unwrap();
        assert_eq!(color, TRACE_BLUE);
        assert!(text.starts_with("Base (8)"));
    }

    #[test]
    fn sesmt_sublist_omits_zero_roles() {
        let req = request(
            ReportKind::Sesmt,
            json!({}),
            json!({
                "roleCounts": {"safetyTechnician": 2, "safetyEngineer": 0, "physician": 1},
                "riskGrade": 3,
                "computationTrace": "t"
            }),
        );
        let t = texts(&layout_report(&req, date()).unwrap());
        assert!(t.contains(&"- Técnico de Segurança do Trabalho: 2".to_string()));
        assert!(t.contains(&"- Médico do Trabalho: 1".to_string()));
        assert!(!t.iter().any(|s| s.contains("Engenheiro")));

        let req = request(
            ReportKind::Sesmt,
            json!({}),
            json!({"roleCounts": {"safetyTechnician": 0}}),
        );
        let t = texts(&layout_report(&req, date()).unwrap());
        assert!(t.contains(&"- Nenhum profissional exigido".to_string()));
    }

    #[test]
    fn labels_are_unique_per_kind() {
        for table in [BRIGADE_FIELDS, CIPA_FIELDS, SESMT_FIELDS] {
            for (i, (_, a)) in table.iter().enumerate() {
                for (_, b) in &table[i + 1..] {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn calculation_payloads_round_trip_through_layout() {
        let tables = TableStore::standard().unwrap();
        let classifier = RiskClassifier::new(&RiskConfig::default());
        let results = vec![
            CalculationResult::Brigade(size_brigade(&tables, 50, "I-2").unwrap()),
            CalculationResult::Brigade(size_brigade(&tables, 7, "X-9").unwrap()),
            // Label starts with "- ", like a sub-list item.
            CalculationResult::Brigade(size_brigade(&tables, 50, "-").unwrap()),
            CalculationResult::Cipa(size_cipa(&tables, &classifier, "4120400", 30, None).unwrap()),
            CalculationResult::Cipa(size_cipa(&tables, &classifier, "4120400", 19, None).unwrap()),
            CalculationResult::Sesmt(
                size_sesmt(&tables, &classifier, "4120400", 700, None).unwrap(),
            ),
        ];

        for result in results {
            let req = ReportRequest::from_result(&result, Map::new());
            let layout = layout_report(&req, date()).unwrap();
            let recovered = recover_payload(req.kind, &layout);

            for (key, value) in &req.payload {
                let expected = match value {
                    Value::Object(m) => Value::Object(
                        m.iter()
                            .filter(|(_, v)| v.as_u64() != Some(0))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect(),
                    ),
                    v => v.clone(),
                };
                assert_eq!(recovered.get(key), Some(&expected), "{:?} {}", req.kind, key);
            }
            assert_eq!(recovered.len(), req.payload.len());
        }
    }

    #[test]
    fn win_ansi_maps_portuguese_letters() {
        assert_eq!(encode_win_ansi("ção"), vec![0xe7, 0xe3, b'o']);
        assert_eq!(encode_win_ansi("≤ 10"), b"<= 10".to_vec());
        assert_eq!(encode_win_ansi("漢"), b"?".to_vec());
    }

    #[test]
    fn pdf_bytes_load_back() {
        let mut payload = Map::new();
        for i in 0..80 {
            payload.insert(format!("Item {}", i), json!("N/A"));
        }
        let req = ReportRequest {
            kind: ReportKind::Checklist,
            metadata: json!({"client": "ACME"}).as_object().cloned().unwrap(),
            payload,
        };
        let pages = layout_report(&req, date()).unwrap().pages.len();
        let bytes = render_report(&req, date()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), pages);
    }

    #[test]
    fn empty_layout_is_a_rendering_failure() {
        let err = render_pdf(&Layout { pages: vec![] }).unwrap_err();
        assert_eq!(err.kind(), "rendering_failure");
    }
}
