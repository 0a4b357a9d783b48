//! Static lookup tables for league classification.
//!
//! Keys are stored normalized. Order matters: alias scans return the first hit.

/// Tournament label → provider league slug.
pub static LEAGUE_ALIASES: &[(&str, &str)] = &[
    // Football: England
    ("premier league", "england-premier-league"),
    ("epl", "england-premier-league"),
    ("english premier league", "england-premier-league"),
    ("championship", "england-championship"),
    ("english championship", "england-championship"),
    ("league one", "england-league-one"),
    ("league two", "england-league-two"),
    ("fa cup", "england-fa-cup"),
    ("efl cup", "england-efl-cup"),
    ("league cup", "england-efl-cup"),
    ("carabao cup", "england-efl-cup"),
    // Football: Spain
    ("la liga", "spain-laliga"),
    ("laliga", "spain-laliga"),
    ("spanish la liga", "spain-laliga"),
    ("segunda division", "spain-segunda-division"),
    ("la liga 2", "spain-segunda-division"),
    ("copa del rey", "spain-copa-del-rey"),
    // Football: Italy
    ("serie a", "italy-serie-a"),
    ("italian serie a", "italy-serie-a"),
    ("serie b", "italy-serie-b"),
    ("coppa italia", "italy-coppa-italia"),
    // Football: Germany
    ("bundesliga", "germany-bundesliga"),
    ("german bundesliga", "germany-bundesliga"),
    ("2 bundesliga", "germany-2-bundesliga"),
    ("bundesliga 2", "germany-2-bundesliga"),
    ("dfb pokal", "germany-dfb-pokal"),
    // Football: France
    ("ligue 1", "france-ligue-1"),
    ("french ligue 1", "france-ligue-1"),
    ("ligue 2", "france-ligue-2"),
    ("coupe de france", "france-coupe-de-france"),
    // Football: other top leagues
    ("eredivisie", "netherlands-eredivisie"),
    ("dutch eredivisie", "netherlands-eredivisie"),
    ("primeira liga", "portugal-primeira-liga"),
    ("liga portugal", "portugal-primeira-liga"),
    ("scottish premiership", "scotland-premiership"),
    ("spfl", "scotland-premiership"),
    ("scottish championship", "scotland-championship"),
    ("super lig", "turkey-super-lig"),
    ("turkish super lig", "turkey-super-lig"),
    ("belgian pro league", "belgium-jupiler-pro-league"),
    ("jupiler pro league", "belgium-jupiler-pro-league"),
    ("belgian first division b", "belgium-first-division-b"),
    ("russian premier league", "russia-premier-league"),
    ("austrian bundesliga", "austria-bundesliga"),
    ("swiss super league", "switzerland-super-league"),
    ("swiss challenge league", "switzerland-challenge-league"),
    ("danish superliga", "denmark-superliga"),
    ("norwegian eliteserien", "norway-eliteserien"),
    ("swedish allsvenskan", "sweden-allsvenskan"),
    // Football: mid-tier Europe
    ("greek super league", "greece-super-league"),
    ("super league greece", "greece-super-league"),
    ("ekstraklasa", "poland-ekstraklasa"),
    ("polish ekstraklasa", "poland-ekstraklasa"),
    ("czech first league", "czech-republic-first-league"),
    ("fortuna liga", "czech-republic-first-league"),
    ("croatian hnl", "croatia-hnl"),
    ("prva hnl", "croatia-hnl"),
    ("romanian liga 1", "romania-liga-1"),
    ("liga 1 romania", "romania-liga-1"),
    ("ukrainian premier league", "ukraine-premier-league"),
    ("serbian superliga", "serbia-super-liga"),
    ("bulgarian first league", "bulgaria-first-league"),
    ("hungarian nb i", "hungary-nb-i"),
    ("slovak super liga", "slovakia-super-liga"),
    // Football: South America
    ("brasileirao", "brazil-serie-a"),
    ("brasileiro serie a", "brazil-serie-a"),
    ("brazilian serie a", "brazil-serie-a"),
    ("argentine primera division", "argentina-primera-division"),
    ("liga profesional", "argentina-primera-division"),
    // Football: international
    ("champions league", "europe-champions-league"),
    ("uefa champions league", "europe-champions-league"),
    ("ucl", "europe-champions-league"),
    ("europa league", "europe-europa-league"),
    ("uefa europa league", "europe-europa-league"),
    ("uel", "europe-europa-league"),
    ("conference league", "europe-conference-league"),
    ("europa conference league", "europe-conference-league"),
    ("world cup", "world-world-cup"),
    ("fifa world cup", "world-world-cup"),
    ("euro", "europe-euro"),
    ("european championship", "europe-euro"),
    ("nations league", "europe-nations-league"),
    ("uefa nations league", "europe-nations-league"),
    ("copa america", "south-america-copa-america"),
    // Football: USA
    ("mls", "usa-mls"),
    ("major league soccer", "usa-mls"),
    // Tennis: grand slams
    ("australian open", "atp-australian-open"),
    ("french open", "atp-french-open"),
    ("roland garros", "atp-french-open"),
    ("wimbledon", "atp-wimbledon"),
    ("us open", "atp-us-open"),
    // Tennis: tours
    ("atp tour", "atp-tour"),
    ("wta tour", "wta-tour"),
    ("atp 1000", "atp-masters-1000"),
    ("atp 500", "atp-500"),
    ("atp 250", "atp-250"),
    // Basketball
    ("nba", "usa-nba"),
    ("national basketball association", "usa-nba"),
    ("euroleague", "europe-euroleague"),
    ("eurocup", "europe-eurocup"),
    ("acb", "spain-acb"),
    ("spanish acb", "spain-acb"),
    // Ice hockey
    ("nhl", "usa-nhl"),
    ("national hockey league", "usa-nhl"),
    ("khl", "russia-khl"),
    ("shl", "sweden-shl"),
    ("liiga", "finland-liiga"),
    // Baseball
    ("mlb", "usa-mlb"),
    ("major league baseball", "usa-mlb"),
    ("npb", "japan-npb"),
    ("kbo", "korea-kbo"),
    // Rugby
    ("six nations", "europe-six-nations"),
    ("rugby championship", "world-rugby-championship"),
    ("premiership rugby", "england-premiership-rugby"),
    ("top 14", "france-top-14"),
    ("super rugby", "world-super-rugby"),
    ("nrl", "australia-nrl"),
    ("super league", "europe-super-league-rugby"),
];

/// Known team (normalized) → its primary league slug.
pub static TEAM_LEAGUES: &[(&str, &str)] = &[
    // England: Premier League
    ("arsenal", "england-premier-league"),
    ("aston villa", "england-premier-league"),
    ("bournemouth", "england-premier-league"),
    ("brentford", "england-premier-league"),
    ("brighton", "england-premier-league"),
    ("burnley", "england-premier-league"),
    ("chelsea", "england-premier-league"),
    ("crystal palace", "england-premier-league"),
    ("everton", "england-premier-league"),
    ("fulham", "england-premier-league"),
    ("liverpool", "england-premier-league"),
    ("luton", "england-premier-league"),
    ("manchester city", "england-premier-league"),
    ("manchester united", "england-premier-league"),
    ("newcastle", "england-premier-league"),
    ("nottingham forest", "england-premier-league"),
    ("sheffield united", "england-premier-league"),
    ("tottenham", "england-premier-league"),
    ("west ham", "england-premier-league"),
    ("wolverhampton", "england-premier-league"),
    ("wolves", "england-premier-league"),
    // Expanded forms produced by team-name normalization
    ("tottenham hotspur", "england-premier-league"),
    ("wolverhampton wanderers", "england-premier-league"),
    ("newcastle united", "england-premier-league"),
    ("west ham united", "england-premier-league"),
    ("brighton hove albion", "england-premier-league"),
    // England: Championship
    ("leeds united", "england-championship"),
    ("leeds", "england-championship"),
    ("leicester city", "england-championship"),
    ("leicester", "england-championship"),
    ("southampton", "england-championship"),
    ("ipswich town", "england-championship"),
    ("ipswich", "england-championship"),
    ("west bromwich albion", "england-championship"),
    ("west brom", "england-championship"),
    ("norwich city", "england-championship"),
    ("norwich", "england-championship"),
    ("middlesbrough", "england-championship"),
    ("coventry city", "england-championship"),
    ("coventry", "england-championship"),
    ("bristol city", "england-championship"),
    ("swansea city", "england-championship"),
    ("swansea", "england-championship"),
    ("hull city", "england-championship"),
    ("hull", "england-championship"),
    ("preston north end", "england-championship"),
    ("preston", "england-championship"),
    ("cardiff city", "england-championship"),
    ("cardiff", "england-championship"),
    ("stoke city", "england-championship"),
    ("stoke", "england-championship"),
    ("millwall", "england-championship"),
    ("blackburn rovers", "england-championship"),
    ("blackburn", "england-championship"),
    ("queens park rangers", "england-championship"),
    ("qpr", "england-championship"),
    ("watford", "england-championship"),
    ("plymouth argyle", "england-championship"),
    ("plymouth", "england-championship"),
    ("birmingham city", "england-championship"),
    ("birmingham", "england-championship"),
    ("rotherham united", "england-championship"),
    ("rotherham", "england-championship"),
    ("sheffield wednesday", "england-championship"),
    // Spain: La Liga
    ("barcelona", "spain-laliga"),
    ("real madrid", "spain-laliga"),
    ("atletico madrid", "spain-laliga"),
    ("sevilla", "spain-laliga"),
    ("real sociedad", "spain-laliga"),
    ("villarreal", "spain-laliga"),
    ("athletic bilbao", "spain-laliga"),
    ("real betis", "spain-laliga"),
    ("valencia", "spain-laliga"),
    ("getafe", "spain-laliga"),
    ("osasuna", "spain-laliga"),
    ("celta vigo", "spain-laliga"),
    ("mallorca", "spain-laliga"),
    ("las palmas", "spain-laliga"),
    ("girona", "spain-laliga"),
    ("rayo vallecano", "spain-laliga"),
    ("almeria", "spain-laliga"),
    ("cadiz", "spain-laliga"),
    ("alaves", "spain-laliga"),
    ("granada", "spain-laliga"),
    // Spain: Segunda
    ("espanyol", "spain-segunda-division"),
    ("real zaragoza", "spain-segunda-division"),
    ("zaragoza", "spain-segunda-division"),
    ("real valladolid", "spain-segunda-division"),
    ("valladolid", "spain-segunda-division"),
    ("sporting gijon", "spain-segunda-division"),
    ("sporting", "spain-segunda-division"),
    ("real oviedo", "spain-segunda-division"),
    ("oviedo", "spain-segunda-division"),
    ("levante", "spain-segunda-division"),
    ("eibar", "spain-segunda-division"),
    ("elche", "spain-segunda-division"),
    ("leganes", "spain-segunda-division"),
    ("burgos", "spain-segunda-division"),
    ("racing santander", "spain-segunda-division"),
    ("racing", "spain-segunda-division"),
    ("tenerife", "spain-segunda-division"),
    ("albacete", "spain-segunda-division"),
    ("mirandes", "spain-segunda-division"),
    ("huesca", "spain-segunda-division"),
    ("cartagena", "spain-segunda-division"),
    ("amorebieta", "spain-segunda-division"),
    ("villarreal b", "spain-segunda-division"),
    ("andorra", "spain-segunda-division"),
    ("racing ferrol", "spain-segunda-division"),
    ("alcorcon", "spain-segunda-division"),
    // Italy: Serie A
    ("inter milan", "italy-serie-a"),
    ("inter", "italy-serie-a"),
    ("ac milan", "italy-serie-a"),
    ("milan", "italy-serie-a"),
    ("juventus", "italy-serie-a"),
    ("napoli", "italy-serie-a"),
    ("roma", "italy-serie-a"),
    ("lazio", "italy-serie-a"),
    ("atalanta", "italy-serie-a"),
    ("fiorentina", "italy-serie-a"),
    ("bologna", "italy-serie-a"),
    ("torino", "italy-serie-a"),
    ("monza", "italy-serie-a"),
    ("udinese", "italy-serie-a"),
    ("sassuolo", "italy-serie-a"),
    ("empoli", "italy-serie-a"),
    ("lecce", "italy-serie-a"),
    ("genoa", "italy-serie-a"),
    ("cagliari", "italy-serie-a"),
    ("frosinone", "italy-serie-a"),
    ("verona", "italy-serie-a"),
    ("salernitana", "italy-serie-a"),
    // Italy: Serie B
    ("parma", "italy-serie-b"),
    ("como", "italy-serie-b"),
    ("venezia", "italy-serie-b"),
    ("cremonese", "italy-serie-b"),
    ("palermo", "italy-serie-b"),
    ("sampdoria", "italy-serie-b"),
    ("brescia", "italy-serie-b"),
    ("catanzaro", "italy-serie-b"),
    ("sudtirol", "italy-serie-b"),
    ("cittadella", "italy-serie-b"),
    ("modena", "italy-serie-b"),
    ("pisa", "italy-serie-b"),
    ("spezia", "italy-serie-b"),
    ("reggiana", "italy-serie-b"),
    ("cosenza", "italy-serie-b"),
    ("ternana", "italy-serie-b"),
    ("bari", "italy-serie-b"),
    ("ascoli", "italy-serie-b"),
    ("feralpisalo", "italy-serie-b"),
    ("lecco", "italy-serie-b"),
    // Germany: Bundesliga
    ("bayern munich", "germany-bundesliga"),
    ("bayern", "germany-bundesliga"),
    ("borussia dortmund", "germany-bundesliga"),
    ("dortmund", "germany-bundesliga"),
    ("bayer leverkusen", "germany-bundesliga"),
    ("leverkusen", "germany-bundesliga"),
    ("rb leipzig", "germany-bundesliga"),
    ("leipzig", "germany-bundesliga"),
    ("eintracht frankfurt", "germany-bundesliga"),
    ("frankfurt", "germany-bundesliga"),
    ("wolfsburg", "germany-bundesliga"),
    ("freiburg", "germany-bundesliga"),
    ("hoffenheim", "germany-bundesliga"),
    ("borussia monchengladbach", "germany-bundesliga"),
    ("monchengladbach", "germany-bundesliga"),
    ("union berlin", "germany-bundesliga"),
    ("koln", "germany-bundesliga"),
    ("cologne", "germany-bundesliga"),
    ("fc koln", "germany-bundesliga"),
    ("mainz", "germany-bundesliga"),
    ("augsburg", "germany-bundesliga"),
    ("werder bremen", "germany-bundesliga"),
    ("bremen", "germany-bundesliga"),
    ("bochum", "germany-bundesliga"),
    ("heidenheim", "germany-bundesliga"),
    ("darmstadt", "germany-bundesliga"),
    // Germany: 2. Bundesliga
    ("schalke", "germany-2-bundesliga"),
    ("schalke 04", "germany-2-bundesliga"),
    ("hamburger sv", "germany-2-bundesliga"),
    ("hamburg", "germany-2-bundesliga"),
    ("hertha berlin", "germany-2-bundesliga"),
    ("hertha", "germany-2-bundesliga"),
    ("fortuna dusseldorf", "germany-2-bundesliga"),
    ("dusseldorf", "germany-2-bundesliga"),
    ("hannover 96", "germany-2-bundesliga"),
    ("hannover", "germany-2-bundesliga"),
    ("st pauli", "germany-2-bundesliga"),
    ("fc st pauli", "germany-2-bundesliga"),
    ("kaiserslautern", "germany-2-bundesliga"),
    ("karlsruher sc", "germany-2-bundesliga"),
    ("karlsruhe", "germany-2-bundesliga"),
    ("nurnberg", "germany-2-bundesliga"),
    ("magdeburg", "germany-2-bundesliga"),
    ("paderborn", "germany-2-bundesliga"),
    ("holstein kiel", "germany-2-bundesliga"),
    ("kiel", "germany-2-bundesliga"),
    ("greuther furth", "germany-2-bundesliga"),
    ("furth", "germany-2-bundesliga"),
    ("hansa rostock", "germany-2-bundesliga"),
    ("rostock", "germany-2-bundesliga"),
    ("wehen wiesbaden", "germany-2-bundesliga"),
    ("wiesbaden", "germany-2-bundesliga"),
    ("eintracht braunschweig", "germany-2-bundesliga"),
    ("braunschweig", "germany-2-bundesliga"),
    // France: Ligue 1
    ("paris saint germain", "france-ligue-1"),
    ("psg", "france-ligue-1"),
    ("marseille", "france-ligue-1"),
    ("monaco", "france-ligue-1"),
    ("lyon", "france-ligue-1"),
    ("lille", "france-ligue-1"),
    ("lens", "france-ligue-1"),
    ("nice", "france-ligue-1"),
    ("rennes", "france-ligue-1"),
    ("strasbourg", "france-ligue-1"),
    ("nantes", "france-ligue-1"),
    ("toulouse", "france-ligue-1"),
    ("montpellier", "france-ligue-1"),
    ("brest", "france-ligue-1"),
    ("reims", "france-ligue-1"),
    ("le havre", "france-ligue-1"),
    ("lorient", "france-ligue-1"),
    ("metz", "france-ligue-1"),
    ("clermont", "france-ligue-1"),
    // France: Ligue 2
    ("bordeaux", "france-ligue-2"),
    ("saint etienne", "france-ligue-2"),
    ("st etienne", "france-ligue-2"),
    ("auxerre", "france-ligue-2"),
    ("laval", "france-ligue-2"),
    ("grenoble", "france-ligue-2"),
    ("annecy", "france-ligue-2"),
    ("paris fc", "france-ligue-2"),
    ("amiens", "france-ligue-2"),
    ("pau", "france-ligue-2"),
    ("rodez", "france-ligue-2"),
    ("bastia", "france-ligue-2"),
    ("valenciennes", "france-ligue-2"),
    ("guingamp", "france-ligue-2"),
    ("dunkerque", "france-ligue-2"),
    ("quevilly rouen", "france-ligue-2"),
    ("rouen", "france-ligue-2"),
    ("caen", "france-ligue-2"),
    ("troyes", "france-ligue-2"),
    ("concarneau", "france-ligue-2"),
    ("angers", "france-ligue-2"),
    ("olympique marseille", "france-ligue-1"),
    ("olympique lyonnais", "france-ligue-1"),
];

/// Tournament keyword → sport, for bets filed under "other".
pub static SPORT_KEYWORDS: &[(&str, &str)] = &[
    ("nba", "basketball"),
    ("nfl", "americanfootball"),
    ("nhl", "icehockey"),
    ("mlb", "baseball"),
    ("atp", "tennis"),
    ("wta", "tennis"),
];

/// Tournament keyword → country token used in league slugs.
pub static COUNTRY_PATTERNS: &[(&str, &str)] = &[
    ("england", "england"),
    ("english", "england"),
    ("spain", "spain"),
    ("spanish", "spain"),
    ("italy", "italy"),
    ("italian", "italy"),
    ("germany", "germany"),
    ("german", "germany"),
    ("france", "france"),
    ("french", "france"),
];

pub fn league_for_alias(alias: &str) -> Option<&'static str> {
    LEAGUE_ALIASES
        .iter()
        .find(|(a, _)| *a == alias)
        .map(|(_, slug)| *slug)
}

pub fn league_for_team(team: &str) -> Option<&'static str> {
    TEAM_LEAGUES
        .iter()
        .find(|(t, _)| *t == team)
        .map(|(_, slug)| *slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::normalize;

    #[test]
    fn table_keys_are_already_normalized() {
        for (key, _) in LEAGUE_ALIASES.iter().chain(TEAM_LEAGUES) {
            assert_eq!(normalize(key), *key, "key {key:?} is not normalized");
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(league_for_alias("serie a"), Some("italy-serie-a"));
        assert_eq!(league_for_team("arsenal"), Some("england-premier-league"));
        assert_eq!(league_for_team("nobody fc"), None);
    }
}
