//! Property-based checks for the pose interpolator and sampler.

use plan_playback_core::{
    sample, sample_times, InterpolationMethod, Keyframe, Plan, PoseInterpolator,
};
use proptest::prelude::*;

/// Plans with 2..8 keyframes, 1..4 joints and strictly increasing times.
fn arb_plan() -> impl Strategy<Value = Plan> {
    (2usize..8, 1usize..4).prop_flat_map(|(keyframes, joints)| {
        let gaps = prop::collection::vec(0.01f64..2.0, keyframes);
        let values = prop::collection::vec(
            prop::collection::vec(-3.0f64..3.0, joints),
            keyframes,
        );
        (0.0f64..5.0, gaps, values).prop_map(|(offset, gaps, values)| {
            let mut time = offset;
            let keyframes = gaps
                .into_iter()
                .zip(values)
                .map(|(gap, configuration)| {
                    let keyframe = Keyframe::new(time, configuration);
                    time += gap;
                    keyframe
                })
                .collect();
            Plan::new(1, keyframes).expect("generated plan is valid")
        })
    })
}

fn arb_method() -> impl Strategy<Value = InterpolationMethod> {
    prop::sample::select(InterpolationMethod::ALL.to_vec())
}

proptest! {
    #[test]
    fn endpoints_match_first_and_last_keyframes(plan in arb_plan(), method in arb_method()) {
        let interp = PoseInterpolator::build(&plan, method).unwrap();
        let first = &plan.keyframes()[0].configuration;
        let last = plan.final_configuration().unwrap();
        let start_pose = interp.evaluate(interp.start_time()).unwrap();
        let end_pose = interp.evaluate(interp.end_time()).unwrap();
        prop_assert_eq!(&start_pose, first);
        prop_assert_eq!(end_pose.as_slice(), last);
    }

    #[test]
    fn pchip_never_overshoots(plan in arb_plan(), fraction in 0.0f64..=1.0) {
        let interp = PoseInterpolator::build(&plan, InterpolationMethod::Pchip).unwrap();
        let times = plan.relative_times();
        let t = fraction * interp.end_time();
        let pose = interp.evaluate(t).unwrap();

        let segment = times
            .windows(2)
            .position(|w| t >= w[0] && t <= w[1])
            .unwrap();
        let left = &plan.keyframes()[segment].configuration;
        let right = &plan.keyframes()[segment + 1].configuration;
        for (joint, value) in pose.iter().enumerate() {
            let lo = left[joint].min(right[joint]);
            let hi = left[joint].max(right[joint]);
            prop_assert!(*value >= lo - 1e-9 && *value <= hi + 1e-9,
                "joint {} value {} outside [{}, {}]", joint, value, lo, hi);
        }
    }

    #[test]
    fn samples_follow_even_spacing(plan in arb_plan(), method in arb_method(), count in 1usize..12) {
        let interp = PoseInterpolator::build(&plan, method).unwrap();
        let poses = sample(&plan, method, count).unwrap();
        prop_assert_eq!(poses.len(), count);

        let times = sample_times(interp.start_time(), interp.end_time(), count).unwrap();
        for (pose, time) in poses.iter().zip(&times) {
            let expected = interp.evaluate(*time).unwrap();
            prop_assert_eq!(pose, &expected);
        }
        if count > 1 {
            let step = interp.end_time() / (count - 1) as f64;
            for (k, time) in times.iter().enumerate() {
                prop_assert!((time - k as f64 * step).abs() < 1e-9);
            }
        } else {
            let expected = interp.evaluate(interp.start_time()).unwrap();
            prop_assert_eq!(&poses[0], &expected);
        }
    }
}
