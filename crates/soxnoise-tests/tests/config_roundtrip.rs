//! Settings files survive a save and load unchanged.
//!
//! ```bash
//! cargo test -p soxnoise-tests --test config_roundtrip
//! ```

use std::fs;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use soxnoise_params::config::{self, ConfigDocument};
use soxnoise_params::{
    DeviceClass, NoiseColor, NumericField, OutputTarget, ParameterSet, SessionFlags,
};

fn output_target() -> impl Strategy<Value = OutputTarget> {
    prop_oneof![
        prop::sample::select(DeviceClass::ALL.to_vec()).prop_map(OutputTarget::device),
        "[a-z]{1,8}\\.wav".prop_map(|path: String| OutputTarget::file(path)),
        Just(OutputTarget::Device {
            class: DeviceClass::Pulse,
            device: Some("sink-2".to_string()),
        }),
    ]
}

/// Either the default or some other value within range.
fn maybe_changed(field: NumericField) -> impl Strategy<Value = Option<f64>> {
    let (lo, hi) = field.range();
    prop::option::of(lo..=hi)
}

prop_compose! {
    fn session()(
        noise in prop::sample::select(NoiseColor::ALL.to_vec()),
        values in (
            maybe_changed(NumericField::Volume),
            maybe_changed(NumericField::BandCenter),
            maybe_changed(NumericField::BandWidth),
            maybe_changed(NumericField::Reverb),
            maybe_changed(NumericField::TremoloSpeed),
            maybe_changed(NumericField::TremoloDepth),
            prop::option::of(1u32..=3600),
            maybe_changed(NumericField::Fade),
        ),
        output in output_target(),
        extras in prop::collection::vec("[a-z0-9]{1,6}", 0..3),
        switches in any::<[bool; 5]>(),
    ) -> (ParameterSet, SessionFlags) {
        let (volume, center, width, reverb, speed, depth, duration, fade) = values;
        let mut params = ParameterSet::default();
        let numeric = [
            (NumericField::Volume, volume),
            (NumericField::BandCenter, center),
            (NumericField::BandWidth, width),
            (NumericField::Reverb, reverb),
            (NumericField::TremoloSpeed, speed),
            (NumericField::TremoloDepth, depth),
            (NumericField::Duration, duration.map(f64::from)),
            (NumericField::Fade, fade),
        ];
        for (field, value) in numeric {
            if let Some(value) = value {
                params.set(field, value);
            }
        }
        params.set_noise(noise);
        params.set_output(output);
        params.set_extras(extras);
        params.set_playing(switches[0]);
        params.set_show_visualization(switches[1]);
        let flags = SessionFlags {
            effects_expanded: switches[2],
            tray: switches[3],
            hidden_on_start: switches[4],
        };
        (params, flags)
    }
}

proptest! {
    /// Saving then loading reproduces every persisted value.
    #[test]
    fn save_then_load_is_identity((params, flags) in session()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("s.sxn");
        config::save(&params, &flags, &path).unwrap();

        let (loaded, loaded_flags, warnings) = config::load(&path).unwrap().resolve();
        prop_assert!(warnings.is_empty());
        prop_assert_eq!(loaded, params);
        prop_assert_eq!(loaded_flags, flags);
    }

    /// Only values that differ from the defaults are written.
    #[test]
    fn documents_are_sparse((params, flags) in session()) {
        let doc = ConfigDocument::from_settings(&params, &flags, &ParameterSet::default());
        let defaults = ParameterSet::default();
        for field in NumericField::ALL {
            let written = doc.get(field.key()).is_some();
            prop_assert_eq!(written, params.get(field) != defaults.get(field), "{}", field);
        }
        prop_assert_eq!(doc.get("noise").is_some(), params.noise() != NoiseColor::default());
        prop_assert_eq!(doc.get("extras").is_some(), !params.extras().is_empty());
    }
}

#[test]
fn default_settings_write_only_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.sxn");
    config::save(&ParameterSet::default(), &SessionFlags::default(), &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[sox-noise]\n");
}

#[test]
fn falsy_non_defaults_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quiet.sxn");
    let params = ParameterSet::default().with(NumericField::Reverb, 0.0);
    config::save(&params, &SessionFlags::default(), &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[sox-noise]\nreverb = 0\n");
    let (loaded, _, _) = config::load(&path).unwrap().resolve();
    assert_eq!(loaded.reverb(), 0.0);
}

#[test]
fn hand_written_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hand.sxn");
    fs::write(
        &path,
        "# my rain sound\n\
         [sox-noise]\n\
         noise = pink\n\
         band-center: 300\n\
         ; louder\n\
         volume = 150\n\
         colour = green\n\
         output = alsa,hw:0,1\n\
         extras = highpass 100\n",
    )
    .unwrap();

    let (params, _, warnings) = config::load(&path).unwrap().resolve();
    assert_eq!(params.noise(), NoiseColor::Pink);
    assert_eq!(params.band_center(), 300.0);
    assert_eq!(params.volume(), 120.0);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        params.output(),
        &OutputTarget::Device {
            class: DeviceClass::Alsa,
            device: Some("hw:0,1".to_string()),
        }
    );
    assert_eq!(params.extras(), ["highpass".to_string(), "100".to_string()]);
}

#[test]
fn file_without_section_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.sxn");
    fs::write(&path, "volume = 40\n").unwrap();
    let err = config::load(&path).unwrap_err();
    assert_eq!(err.code(), "CONFIG_003");
}
