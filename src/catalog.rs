//! Reference lists shared by the complaint and license-report forms.

pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Package Food",
        &[
            "Dairy products",
            "Fats & oils",
            "Edible ices including sorbet",
            "Confectionery",
            "Cereal & cereal products",
            "Bakery products",
            "Meat & meat products including poultry",
            "Fish & fish products",
            "Egg & egg products",
            "Sweeteners including honey",
            "Salt, spices, soups, sauces, salads & protein products",
            "Beverages excluding dairy products",
            "Ready to eat savouries",
            "Prepared food",
            "Nutraceuticals",
            "Fruit and Vegetables",
            "Others",
        ],
    ),
    (
        "Food Catering Premises",
        &[
            "Restaurant",
            "Café",
            "Food Stalls",
            "Food Trucks",
            "Catering Service",
            "Others",
        ],
    ),
    (
        "Online aggregator/e-commerce",
        &[
            "Food Delivery Platform",
            "Online Grocery",
            "Meal Kit Service",
            "Others",
        ],
    ),
    (
        "Retailer Premises",
        &[
            "Supermarket",
            "Grocery Store",
            "Convenience Store",
            "Specialty Food Store",
            "Others",
        ],
    ),
    ("Others", &["Other Food Business"]),
];

pub const CONCERN_TYPES: &[&str] = &[
    "Food Quality",
    "Hygiene Issues",
    "Allergen Concerns",
    "Foreign Objects",
    "Foodborne Illness",
    "Labeling Issues",
    "Expired Product",
    "Packaging Issues",
    "Others",
];

pub const STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Delhi",
    "Chandigarh",
    "Others",
];

pub fn categories() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|(name, _)| *name)
}

pub fn sub_categories(category: &str) -> Option<&'static [&'static str]> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, subs)| *subs)
}

pub fn is_known_state(state: &str) -> bool {
    STATES.contains(&state)
}

pub fn is_known_concern(concern: &str) -> bool {
    CONCERN_TYPES.contains(&concern)
}
