use randomtalk_macros::value_object;

#[value_object]
struct Radius {
    km: u32,
}

#[value_object(eq = false)]
struct Point {
    lat: f64,
    lon: f64,
}

#[value_object(debug = false, default = false)]
struct Secret(String);

#[value_object]
#[derive(Copy)]
enum Tier {
    #[default]
    Free,
    Premium,
}

fn main() {
    let r = Radius::default();
    assert_eq!(r.clone(), Radius { km: 0 });
    let _ = format!("{r:?}");

    let p = Point { lat: 1.5, lon: 2.5 };
    assert!(p == p.clone());

    let _ = Secret("s".to_string()).clone();

    let tier: Tier = Default::default();
    assert_eq!(tier, Tier::Free);
    assert_ne!(tier, Tier::Premium);
}
