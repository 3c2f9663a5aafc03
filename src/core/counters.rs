/// A board field fed from one named entry of `targetCounters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterField {
    pub field: &'static str,
    pub counter: &'static str,
}

const fn field(field: &'static str, counter: &'static str) -> CounterField {
    CounterField { field, counter }
}

// foldersMetadataSubmitted reads "Folders submitted": the server keeps no
// separate submitted counter for folder metadata.
pub const COUNTER_FIELDS: [CounterField; 28] = [
    field("folderBatchesSubmitted", "Folder Batches submitted"),
    field("folderBatchesCompleted", "Folder Batches completed"),
    field("documentBatchesSubmitted", "Document Batches submitted"),
    field("documentBatchesCompleted", "Document Batches completed"),
    field("totalNodesSubmitted", "Nodes submitted"),
    field("totalNodesCompleted", "Nodes completed"),
    field("foldersSubmitted", "Folders submitted"),
    field("foldersCompleted", "Folders completed"),
    field("foldersSkipped", "Folders skipped"),
    field("foldersErrors", "Folders errors"),
    field("foldersMetadataSubmitted", "Folders submitted"),
    field("foldersMetadataCompleted", "Folders metadata completed"),
    field("foldersMetadataSkipped", "Folders metadata skipped"),
    field("foldersMetadataErrors", "Folders metadata errors"),
    field("documentsSubmitted", "Documents submitted"),
    field("documentsCompleted", "Documents completed"),
    field("documentsSkipped", "Documents skipped"),
    field("documentsErrors", "Documents errors"),
    field("documentsMetadataCompleted", "Documents metadata completed"),
    field("documentsMetadataSkipped", "Documents metadata skipped"),
    field("documentsMetadataErrors", "Documents metadata errors"),
    field("versionsSubmitted", "Versions submitted"),
    field("versionsCompleted", "Versions completed"),
    field("versionsSkipped", "Versions skipped"),
    field("versionsErrors", "Versions errors"),
    field("versionsMetadataCompleted", "Versions metadata completed"),
    field("versionsMetadataSkipped", "Versions metadata skipped"),
    field("versionsMetadataErrors", "Versions metadata errors"),
];

/// One row of the dashboard's counter table. Columns are board field ids;
/// `None` where the server has no such counter.
#[derive(Debug, Clone, Copy)]
pub struct CounterRow {
    pub title: &'static str,
    pub submitted: Option<&'static str>,
    pub completed: Option<&'static str>,
    pub skipped: Option<&'static str>,
    pub errors: Option<&'static str>,
}

const fn row(
    title: &'static str,
    submitted: Option<&'static str>,
    completed: Option<&'static str>,
    skipped: Option<&'static str>,
    errors: Option<&'static str>,
) -> CounterRow {
    CounterRow {
        title,
        submitted,
        completed,
        skipped,
        errors,
    }
}

pub const COUNTER_ROWS: [CounterRow; 9] = [
    row(
        "Folder batches",
        Some("folderBatchesSubmitted"),
        Some("folderBatchesCompleted"),
        None,
        None,
    ),
    row(
        "Document batches",
        Some("documentBatchesSubmitted"),
        Some("documentBatchesCompleted"),
        None,
        None,
    ),
    row(
        "Nodes",
        Some("totalNodesSubmitted"),
        Some("totalNodesCompleted"),
        None,
        None,
    ),
    row(
        "Folders",
        Some("foldersSubmitted"),
        Some("foldersCompleted"),
        Some("foldersSkipped"),
        Some("foldersErrors"),
    ),
    row(
        "Folder metadata",
        Some("foldersMetadataSubmitted"),
        Some("foldersMetadataCompleted"),
        Some("foldersMetadataSkipped"),
        Some("foldersMetadataErrors"),
    ),
    row(
        "Documents",
        Some("documentsSubmitted"),
        Some("documentsCompleted"),
        Some("documentsSkipped"),
        Some("documentsErrors"),
    ),
    row(
        "Document metadata",
        None,
        Some("documentsMetadataCompleted"),
        Some("documentsMetadataSkipped"),
        Some("documentsMetadataErrors"),
    ),
    row(
        "Versions",
        Some("versionsSubmitted"),
        Some("versionsCompleted"),
        Some("versionsSkipped"),
        Some("versionsErrors"),
    ),
    row(
        "Version metadata",
        None,
        Some("versionsMetadataCompleted"),
        Some("versionsMetadataSkipped"),
        Some("versionsMetadataErrors"),
    ),
];

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn field_ids_are_unique() {
        let ids: BTreeSet<_> = COUNTER_FIELDS.iter().map(|f| f.field).collect();
        assert_eq!(ids.len(), COUNTER_FIELDS.len());
    }

    #[test]
    fn table_rows_cover_every_counter_field_once() {
        let mut from_rows: Vec<&str> = COUNTER_ROWS
            .iter()
            .flat_map(|r| [r.submitted, r.completed, r.skipped, r.errors])
            .flatten()
            .collect();
        from_rows.sort_unstable();
        let mut from_fields: Vec<&str> = COUNTER_FIELDS.iter().map(|f| f.field).collect();
        from_fields.sort_unstable();
        assert_eq!(from_rows, from_fields);
    }
}
