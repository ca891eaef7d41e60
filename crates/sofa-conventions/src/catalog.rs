//! Built-in conventions.

use sofa_format::keys;
use sofa_spatial::{Descriptor, ObjectKind, System};

use crate::convention::{Convention, ObjectDefaults};
use crate::datatype::DataType;
use crate::room::RoomType;
use crate::rule::{Rule, RuleKind};

/// Ear offset from the head center, in meters.
pub const HEAD_RADIUS: f64 = 0.09;

/// Left (+y) and right (-y) transducer offsets.
fn ears() -> Vec<[f64; 3]> {
    vec![[0.0, HEAD_RADIUS, 0.0], [0.0, -HEAD_RADIUS, 0.0]]
}

/// `General<DataType>`: the baseline rules and nothing else.
pub fn general(data_type: DataType) -> Convention {
    Convention::new(format!("General{data_type}"), "1.0", data_type)
}

fn simple_free_field(name: &str, data_type: DataType) -> Convention {
    Convention::new(name, "1.0", data_type)
        .with_rule(Rule::count(ObjectKind::Emitter, 1))
        .with_rule(Rule::view_and_up(ObjectKind::Listener))
        .with_object(
            ObjectKind::Source,
            ObjectDefaults::default()
                .with_count(1)
                .with_position([0.0, 0.0, 1.0], System::Spherical),
        )
        .with_object(ObjectKind::Emitter, ObjectDefaults::default().with_count(1))
        .with_object(
            ObjectKind::Receiver,
            ObjectDefaults::default().with_local_positions(ears()),
        )
        .with_metadata_key(keys::DATABASE_NAME)
        .with_metadata_key(keys::LISTENER_SHORT_NAME)
}

/// Head-related impulse responses measured in free field.
pub fn simple_free_field_hrir() -> Convention {
    simple_free_field("SimpleFreeFieldHRIR", DataType::Fir)
}

pub fn simple_free_field_tf() -> Convention {
    simple_free_field("SimpleFreeFieldTF", DataType::Tf)
}

/// Free-field HRTFs as second-order sections, always two ears.
pub fn simple_free_field_sos() -> Convention {
    simple_free_field("SimpleFreeFieldSOS", DataType::Sos)
        .with_rule(Rule::count(ObjectKind::Receiver, 2))
        .with_object(
            ObjectKind::Receiver,
            ObjectDefaults::default()
                .with_count(2)
                .with_local_positions(ears()),
        )
}

/// Headphone impulse responses: two emitters into two ears.
pub fn simple_headphone_ir() -> Convention {
    Convention::new("SimpleHeadphoneIR", "0.2", DataType::Fir)
        .with_rule(Rule::view_and_up(ObjectKind::Listener))
        .with_rule(Rule::count(ObjectKind::Receiver, 2))
        .with_rule(Rule::count(ObjectKind::Emitter, 2))
        .with_object(
            ObjectKind::Receiver,
            ObjectDefaults::default()
                .with_count(2)
                .with_local_positions(ears()),
        )
        .with_object(
            ObjectKind::Emitter,
            ObjectDefaults::default()
                .with_count(2)
                .with_local_positions(ears()),
        )
        .with_metadata_key(keys::DATABASE_NAME)
        .with_metadata_key(keys::LISTENER_SHORT_NAME)
}

/// Binaural room impulse responses from several loudspeakers.
pub fn multi_speaker_brir() -> Convention {
    Convention::new("MultiSpeakerBRIR", "0.3", DataType::Fire)
        .with_room_type(RoomType::Reverberant)
        .with_rule(Rule::view_and_up(ObjectKind::Listener))
        .with_rule(Rule::count(ObjectKind::Receiver, 2))
        .with_rule(Rule::new(
            "Emitter View and Up together",
            RuleKind::DependsOn {
                object: Some(ObjectKind::Emitter),
                descriptor: Descriptor::View,
                requires: Descriptor::Up,
            },
        ))
        .with_object(
            ObjectKind::Receiver,
            ObjectDefaults::default()
                .with_count(2)
                .with_local_positions(ears()),
        )
        .with_metadata_key(keys::DATABASE_NAME)
        .with_metadata_key(keys::LISTENER_SHORT_NAME)
}

/// Directional room impulse responses of a single source.
pub fn single_room_drir() -> Convention {
    Convention::new("SingleRoomDRIR", "0.3", DataType::Fir)
        .with_room_type(RoomType::Reverberant)
        .with_rule(Rule::count(ObjectKind::Emitter, 1))
        .with_rule(Rule::view_and_up(ObjectKind::Listener))
        .with_rule(Rule::view_and_up(ObjectKind::Source))
        .with_object(
            ObjectKind::Source,
            ObjectDefaults::default()
                .with_count(1)
                .with_view([-1.0, 0.0, 0.0]),
        )
        .with_object(ObjectKind::Emitter, ObjectDefaults::default().with_count(1))
}

/// Every built-in convention.
pub fn builtin() -> Vec<Convention> {
    let mut all: Vec<Convention> = DataType::ALL.into_iter().map(general).collect();
    all.extend([
        simple_free_field_hrir(),
        simple_free_field_tf(),
        simple_free_field_sos(),
        simple_headphone_ir(),
        multi_speaker_brir(),
        single_room_drir(),
    ]);
    all
}
