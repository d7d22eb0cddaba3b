mod common;

use applenotes_core::{
    convert_batch, BatchCounts, ConvertContext, ConvertOptions, NoteInput, NoteMetadata,
    NullResolver,
};
use common::{note, note_store_blob, run};
use uuid::Uuid;

fn metadata(id: u128) -> NoteMetadata {
    NoteMetadata::new(Uuid::from_u128(id))
}

#[test]
fn failing_notes_do_not_stop_the_batch() {
    let mut locked = metadata(2);
    locked.password_protected = true;

    let inputs = vec![
        NoteInput::note_store(metadata(1), note_store_blob(note("one", vec![run("one")]))),
        NoteInput::note_store(locked, b"secret".to_vec()),
        NoteInput::note_store(metadata(3), b"garbage".to_vec()),
        NoteInput::note_store(metadata(4), note_store_blob(note("four", vec![run("fo")]))),
        NoteInput::note_store(
            metadata(5),
            note_store_blob(note("\u{fffc}", vec![run("\u{fffc}").message(
                12,
                common::Proto::new().string(1, "IMG"),
            )])),
        ),
    ];

    let options = ConvertOptions::default();
    let context = ConvertContext::new(&options, &NullResolver, &NullResolver);
    let report = convert_batch(&inputs, context);

    assert_eq!(
        report.counts,
        BatchCounts {
            converted: 2,
            skipped_password_protected: 1,
            decompression_failures: 1,
            schema_mismatches: 0,
            malformed: 1,
            anomalies: 1,
        }
    );
    assert_eq!(report.counts.failed(), 2);

    let converted: Vec<_> = report.converted.iter().map(|note| note.note_id).collect();
    assert_eq!(converted, vec![Uuid::from_u128(1), Uuid::from_u128(5)]);
    assert_eq!(report.converted[0].markdown, "one");

    let failed: Vec<_> = report.failures.iter().map(|err| err.note_id).collect();
    assert_eq!(
        failed,
        vec![Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(4)]
    );
}

#[test]
fn counts_serialize_for_reports() {
    let value = serde_json::to_value(BatchCounts::default()).expect("serialize");
    assert_eq!(value["converted"], 0);
    assert_eq!(value["skipped_password_protected"], 0);
}
